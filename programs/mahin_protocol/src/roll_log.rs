//! Off-chain audit log of rolls, folded from emitted events.
//!
//! Indexers feed events in transaction order together with the transaction
//! signature. Nothing here is authoritative; the Doctor account is.

use thiserror::Error;

use crate::events::{Diagnosed, RollAborted, RollComplete, RollInProgress};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollLogEvent {
    InProgress(RollInProgress),
    Complete(RollComplete),
    Aborted(RollAborted),
    Diagnosed(Diagnosed),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RollLogError {
    #[error("roll-{requested} requested while roll-{open} is open")]
    RollAlreadyOpen { open: u64, requested: u64 },
    #[error("roll-{roll_id} is not open")]
    NoOpenRoll { roll_id: u64 },
    #[error("roll-{roll_id} already logged")]
    DuplicateRoll { roll_id: u64 },
    #[error("token {token_id} diagnosed twice")]
    DuplicateDiagnosis { token_id: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollLogEntry {
    pub id: String,
    pub roll_id: u64,
    pub requested_at: i64,
    pub request_tx: String,
    pub applied_at: Option<i64>,
    pub apply_tx: Option<String>,
    pub probability: u128,
    pub use_fallback: bool,
    pub aborted: bool,
    pub diagnoses: Vec<u32>,
}

impl RollLogEntry {
    pub fn entry_id(roll_id: u64) -> String {
        format!("roll-{roll_id}")
    }

    pub fn is_closed(&self) -> bool {
        self.applied_at.is_some() || self.aborted
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollLog {
    pub entries: Vec<RollLogEntry>,
    pub roll_count: u64,
    pub diagnosed_count: u32,
    pub diagnosed_token_ids: Vec<u32>,
}

impl RollLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_entry(&self) -> Option<&RollLogEntry> {
        self.entries.last().filter(|e| !e.is_closed())
    }

    pub fn get(&self, roll_id: u64) -> Option<&RollLogEntry> {
        self.entries.iter().find(|e| e.roll_id == roll_id)
    }

    pub fn apply(&mut self, event: &RollLogEvent, tx: &str) -> Result<(), RollLogError> {
        match event {
            RollLogEvent::InProgress(ev) => self.on_in_progress(ev, tx),
            RollLogEvent::Complete(ev) => self.on_complete(ev, tx),
            RollLogEvent::Aborted(ev) => {
                let entry = self.open_mut(ev.roll_id)?;
                entry.aborted = true;
                Ok(())
            }
            RollLogEvent::Diagnosed(ev) => self.on_diagnosed(ev),
        }
    }

    /// Folds a whole stream; stops at the first out-of-order event.
    pub fn replay<'a, I>(events: I) -> Result<Self, RollLogError>
    where
        I: IntoIterator<Item = (&'a RollLogEvent, &'a str)>,
    {
        let mut log = Self::new();
        for (event, tx) in events {
            log.apply(event, tx)?;
        }
        Ok(log)
    }

    fn on_in_progress(&mut self, ev: &RollInProgress, tx: &str) -> Result<(), RollLogError> {
        if let Some(open) = self.open_entry() {
            return Err(RollLogError::RollAlreadyOpen {
                open: open.roll_id,
                requested: ev.roll_id,
            });
        }
        if self.get(ev.roll_id).is_some() {
            return Err(RollLogError::DuplicateRoll { roll_id: ev.roll_id });
        }

        self.entries.push(RollLogEntry {
            id: RollLogEntry::entry_id(ev.roll_id),
            roll_id: ev.roll_id,
            requested_at: ev.requested_at,
            request_tx: tx.to_string(),
            applied_at: None,
            apply_tx: None,
            probability: ev.probability,
            use_fallback: ev.use_fallback,
            aborted: false,
            diagnoses: Vec::new(),
        });
        self.roll_count += 1;
        Ok(())
    }

    fn on_complete(&mut self, ev: &RollComplete, tx: &str) -> Result<(), RollLogError> {
        let entry = self.open_mut(ev.roll_id)?;
        entry.applied_at = Some(ev.applied_at);
        entry.apply_tx = Some(tx.to_string());
        Ok(())
    }

    fn on_diagnosed(&mut self, ev: &Diagnosed) -> Result<(), RollLogError> {
        if self.diagnosed_token_ids.contains(&ev.token_id) {
            return Err(RollLogError::DuplicateDiagnosis { token_id: ev.token_id });
        }
        // admin overrides carry no roll
        if let Some(roll_id) = ev.roll_id {
            let entry = self.open_mut(roll_id)?;
            entry.diagnoses.push(ev.token_id);
        }
        self.diagnosed_token_ids.push(ev.token_id);
        self.diagnosed_count += 1;
        Ok(())
    }

    fn open_mut(&mut self, roll_id: u64) -> Result<&mut RollLogEntry, RollLogError> {
        match self.entries.last_mut() {
            Some(e) if e.roll_id == roll_id && !e.is_closed() => Ok(e),
            _ => Err(RollLogError::NoOpenRoll { roll_id }),
        }
    }
}
