pub mod admin;
pub mod mint_date;
pub mod oracle;
pub mod registry;
pub mod roll;
pub mod seller;
