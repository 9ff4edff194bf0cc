//! Payment state persistence, keyed by message id.
//!
//! The state of a payment belongs to its persisted message record; the
//! thread only writes it through [`PaymentStore::save`] after a lawful
//! transition.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::payment::PaymentState;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random v4 UUID for messages that arrive without an identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait PaymentStore {
    fn load(&self, id: &MessageId) -> Result<Option<PaymentState>, StoreError>;
    fn save(&self, id: &MessageId, state: PaymentState) -> Result<(), StoreError>;
}

impl<S: PaymentStore + ?Sized> PaymentStore for Arc<S> {
    fn load(&self, id: &MessageId) -> Result<Option<PaymentState>, StoreError> {
        (**self).load(id)
    }

    fn save(&self, id: &MessageId, state: PaymentState) -> Result<(), StoreError> {
        (**self).save(id, state)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPaymentStore {
    states: Mutex<HashMap<MessageId, PaymentState>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

impl PaymentStore for MemoryPaymentStore {
    fn load(&self, id: &MessageId) -> Result<Option<PaymentState>, StoreError> {
        Ok(self.states.lock().get(id).copied())
    }

    fn save(&self, id: &MessageId, state: PaymentState) -> Result<(), StoreError> {
        self.states.lock().insert(id.clone(), state);
        Ok(())
    }
}

/// Whole-file JSON map of `message id -> state`, rewritten on every save.
pub struct JsonFilePaymentStore {
    path: PathBuf,
    states: Mutex<BTreeMap<MessageId, PaymentState>>,
}

impl JsonFilePaymentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let states = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            states: Mutex::new(states),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, states: &BTreeMap<MessageId, PaymentState>) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(states)?;
        // write-then-rename so a crash never leaves a truncated map behind
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PaymentStore for JsonFilePaymentStore {
    fn load(&self, id: &MessageId) -> Result<Option<PaymentState>, StoreError> {
        Ok(self.states.lock().get(id).copied())
    }

    fn save(&self, id: &MessageId, state: PaymentState) -> Result<(), StoreError> {
        let mut states = self.states.lock();
        let previous = states.insert(id.clone(), state);
        if let Err(e) = self.persist(&states) {
            match previous {
                Some(previous) => states.insert(id.clone(), previous),
                None => states.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }
}
