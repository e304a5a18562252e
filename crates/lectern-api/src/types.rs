//! Request and response types for the study server

use serde::{Deserialize, Serialize};

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's utterance
    pub message: String,
    /// Document the conversation is about
    pub doc_id: String,
    /// Continuation token from the previous turn (`null` for a new conversation)
    pub checkpoint_id: Option<String>,
}

impl ChatRequest {
    /// Create a chat request
    pub fn new(
        message: impl Into<String>,
        doc_id: impl Into<String>,
        checkpoint_id: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            doc_id: doc_id.into(),
            checkpoint_id,
        }
    }
}

/// A processed document known to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub filename: String,
}

/// Response of `GET /documents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentInfo>,
}

/// Response of `POST /upload_pdf`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub doc_id: String,
    pub filename: String,
    /// Processing status reported by the server
    #[serde(default)]
    pub status: Option<String>,
}

impl From<UploadedDocument> for DocumentInfo {
    fn from(doc: UploadedDocument) -> Self {
        Self {
            doc_id: doc.doc_id,
            filename: doc.filename,
        }
    }
}

/// Response of `DELETE /documents/{doc_id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_null_checkpoint() {
        let req = ChatRequest::new("hi", "doc-1", None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "hi", "doc_id": "doc-1", "checkpoint_id": null})
        );
    }

    #[test]
    fn test_document_list_shape() {
        let list: DocumentList = serde_json::from_str(
            r#"{"documents": [{"doc_id": "a1", "filename": "a1.pdf"}]}"#,
        )
        .unwrap();
        assert_eq!(list.documents.len(), 1);
        assert_eq!(list.documents[0].filename, "a1.pdf");

        let empty: DocumentList = serde_json::from_str("{}").unwrap();
        assert!(empty.documents.is_empty());
    }

    #[test]
    fn test_upload_result_tolerates_extra_fields() {
        let doc: UploadedDocument = serde_json::from_str(
            r#"{"doc_id": "x", "filename": "notes.pdf", "status": "success", "chunks": 42}"#,
        )
        .unwrap();
        assert_eq!(doc.status.as_deref(), Some("success"));
        let info: DocumentInfo = doc.into();
        assert_eq!(info.doc_id, "x");
    }
}
