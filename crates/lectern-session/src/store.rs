//! Keyed conversation persistence

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::conversation::ConversationRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A saved record exists but cannot be decoded
    #[error("Corrupt conversation for document {doc_id}: {source}")]
    Corrupt {
        doc_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize conversation: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Saved conversations keyed by document id.
///
/// Implementations are called synchronously from the turn loop, so writes
/// should be quick (one small JSON document per conversation).
pub trait ConversationStore: Send + Sync {
    /// Load the record for `doc_id`; `Ok(None)` if nothing is saved
    fn load(&self, doc_id: &str) -> Result<Option<ConversationRecord>, StoreError>;

    /// Replace the record for `doc_id`
    fn save(&self, doc_id: &str, record: &ConversationRecord) -> Result<(), StoreError>;

    /// Remove the record for `doc_id`; removing a missing record is not an error
    fn remove(&self, doc_id: &str) -> Result<(), StoreError>;
}

/// In-process store holding serialized records.
///
/// Records are kept as JSON text so a corrupt entry can be planted and
/// loading goes through the same decode path as a file store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text for `doc_id`, bypassing serialization
    pub fn insert_raw(&self, doc_id: impl Into<String>, json: impl Into<String>) {
        self.records.lock().insert(doc_id.into(), json.into());
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.records.lock().contains_key(doc_id)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ConversationStore for MemoryStore {
    fn load(&self, doc_id: &str) -> Result<Option<ConversationRecord>, StoreError> {
        let records = self.records.lock();
        let Some(json) = records.get(doc_id) else {
            return Ok(None);
        };
        serde_json::from_str(json)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                doc_id: doc_id.to_string(),
                source,
            })
    }

    fn save(&self, doc_id: &str, record: &ConversationRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(StoreError::Serialize)?;
        self.records.lock().insert(doc_id.to_string(), json);
        Ok(())
    }

    fn remove(&self, doc_id: &str) -> Result<(), StoreError> {
        self.records.lock().remove(doc_id);
        Ok(())
    }
}
