//! Conversations saved as one JSON file per document

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lectern_session::{ConversationRecord, ConversationStore, StoreError};

/// Stores each conversation at `<dir>/<doc_id>.json`
pub struct FileConversationStore {
    dir: PathBuf,
}

impl FileConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, doc_id: &str) -> PathBuf {
        let name: String = doc_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl ConversationStore for FileConversationStore {
    fn load(&self, doc_id: &str) -> Result<Option<ConversationRecord>, StoreError> {
        let content = match fs::read_to_string(self.path_for(doc_id)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                doc_id: doc_id.to_string(),
                source,
            })
    }

    fn save(&self, doc_id: &str, record: &ConversationRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(record).map_err(StoreError::Serialize)?;
        fs::write(self.path_for(doc_id), content)?;
        Ok(())
    }

    fn remove(&self, doc_id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(doc_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
