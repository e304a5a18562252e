//! HTTP client for the study server

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    stream::{ChatEventStream, decode_stream},
    types::{ChatRequest, DeleteResult, DocumentInfo, DocumentList, HealthStatus, UploadedDocument},
};

/// Opens one streamed chat turn
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and return the decoded event stream.
    ///
    /// Failing to open the stream (connection error, non-success status) is
    /// reported as `Err`; cancellation before the response arrives is
    /// `Err(Error::Aborted)`. Once open, failures arrive as `Error` events.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatEventStream>;
}

/// Remote document management
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List processed documents
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>>;

    /// Delete a document and its index
    async fn delete_document(&self, doc_id: &str) -> Result<DeleteResult>;

    /// Upload a PDF for processing
    async fn upload_document(&self, path: &Path) -> Result<UploadedDocument>;
}

/// Client for the study server's HTTP API
#[derive(Clone)]
pub struct StudyClient {
    client: reqwest::Client,
    base_url: String,
}

impl StudyClient {
    /// Default server location
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";

    /// Create a client for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The server base URL (without trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.url("/health")).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

impl Default for StudyClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

/// Turn a non-success response into `Error::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::status(status.as_u16(), body))
}

#[async_trait]
impl ChatTransport for StudyClient {
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ChatEventStream> {
        let url = self.url("/chat");
        tracing::debug!(
            "Opening chat stream: {} (doc {}, checkpoint {:?})",
            url,
            request.doc_id,
            request.checkpoint_id
        );

        let send = self.client.post(&url).json(&request).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            response = send => response?,
        };
        let response = check_status(response).await?;

        Ok(decode_stream(response.bytes_stream(), cancel))
    }
}

#[async_trait]
impl DocumentStore for StudyClient {
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let response = self.client.get(self.url("/documents")).send().await?;
        let list: DocumentList = check_status(response).await?.json().await?;
        tracing::debug!("Server reported {} documents", list.documents.len());
        Ok(list.documents)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<DeleteResult> {
        let url = self.url(&format!("/documents/{}", doc_id));
        let response = self.client.delete(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn upload_document(&self, path: &Path) -> Result<UploadedDocument> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnexpectedResponse(format!("Not a file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        tracing::info!("Uploading {} ({} bytes)", filename, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload_pdf"))
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = StudyClient::new("http://example.test:8000/");
        assert_eq!(client.base_url(), "http://example.test:8000");
        assert_eq!(client.url("/chat"), "http://example.test:8000/chat");
    }

    #[test]
    fn test_default_points_at_localhost() {
        assert_eq!(StudyClient::default().base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_cancelled_before_send_is_aborted() {
        // Port 9 (discard) on localhost; the request never gets a chance to run
        let client = StudyClient::new("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = client
            .stream_chat(ChatRequest::new("hi", "doc", None), cancel)
            .await;
        assert!(matches!(result, Err(Error::Aborted)));
    }
}
