//! Document Façade: upload, list and delete documents on the backend.
//!
//! Uploads are validated before the file is read or any request is sent. The
//! local [`DocumentCache`] mirrors the last listing and is refreshed after
//! every upload or delete.

pub mod cache;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};

use crate::api::schema::{DeleteResponse, DocumentList, UploadResponse};
use crate::api::{ApiClient, ClientError, DocumentRecord, Operation, Result};

pub use cache::DocumentCache;
pub use validate::{ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES};

/// Asks the user before a destructive action. An error means the question
/// could not be asked at all.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Answers every prompt the same way.
pub struct AlwaysAnswer(pub bool);

impl Confirmer for AlwaysAnswer {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub file_name: String,
    pub document_id: Option<String>,
    pub chunks_created: u64,
    pub processing_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted {
        file_name: String,
        chunks_deleted: u64,
    },
    Cancelled,
}

pub struct DocumentVault {
    api: Arc<ApiClient>,
    cache: Arc<DocumentCache>,
    max_upload_bytes: u64,
}

impl DocumentVault {
    pub fn new(api: Arc<ApiClient>, cache: Arc<DocumentCache>, max_upload_bytes: u64) -> Self {
        Self {
            api,
            cache,
            max_upload_bytes,
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadReport> {
        let kind = validate::check_type(path)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            ClientError::validation(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::validation(format!(
                "{} is not a file",
                path.display()
            )));
        }
        validate::check_size(metadata.len(), self.max_upload_bytes)?;

        let data = read_upload(path, self.max_upload_bytes).await?;
        let data_len = data.len();
        let part = Part::bytes(data)
            .file_name(kind.file_name.clone())
            .mime_str(kind.mime_type)
            .map_err(|e| ClientError::validation(format!("Invalid MIME type: {e}")))?;
        let form = Form::new().part("file", part);

        tracing::info!(file = %kind.file_name, bytes = data_len, "Uploading document");
        let response: UploadResponse = self
            .api
            .post_multipart(Operation::Upload, "/upload", form)
            .await?;

        self.refresh_cache().await;

        Ok(UploadReport {
            file_name: response.file_name.unwrap_or(kind.file_name),
            document_id: response.document_id,
            chunks_created: response.chunks_created,
            processing_time: response.processing_time,
        })
    }

    /// Fetch the document collection and mirror it into the cache. An empty
    /// collection is a normal result.
    pub async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let listing: DocumentList = self
            .api
            .get_json(Operation::ListDocuments, "/documents")
            .await?;
        if let Err(e) = self.cache.replace_all(&listing.documents) {
            tracing::warn!("Failed to update document cache: {}", e);
        }
        Ok(listing.documents)
    }

    /// The last listing seen, without a request.
    pub fn cached(&self) -> Result<Vec<DocumentRecord>> {
        self.cache.list()
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Delete a document after the confirmer agrees. A declined prompt sends
    /// nothing.
    pub async fn delete(&self, id_or_prefix: &str, confirmer: &dyn Confirmer) -> Result<DeleteOutcome> {
        let id_or_prefix = id_or_prefix.trim();
        if id_or_prefix.is_empty() {
            return Err(ClientError::validation("Document id is required"));
        }

        let cached = self.cache.resolve(id_or_prefix)?;
        let document_id = cached
            .as_ref()
            .and_then(|d| d.id())
            .unwrap_or(id_or_prefix)
            .to_string();
        let file_name = cached
            .as_ref()
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| document_id.clone());

        if !confirmer.confirm(&format!("Are you sure you want to delete \"{file_name}\"?"))? {
            tracing::debug!(%document_id, "Delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let path = format!("/documents/{}", urlencoding::encode(&document_id));
        let response: DeleteResponse = self
            .api
            .delete_json(Operation::DeleteDocument, &path)
            .await?;
        tracing::info!(%document_id, chunks = response.chunks_deleted, "Document deleted");

        self.refresh_cache().await;

        Ok(DeleteOutcome::Deleted {
            file_name,
            chunks_deleted: response.chunks_deleted,
        })
    }

    async fn refresh_cache(&self) {
        if let Err(e) = self.list().await {
            tracing::warn!("Could not refresh document list: {}", e);
        }
    }
}

/// Read the file and check the size again; it may have grown since the
/// metadata check.
async fn read_upload(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let data = tokio::fs::read(path).await?;
    validate::check_size(data.len() as u64, max_bytes)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct NoTerminal;

    impl Confirmer for NoTerminal {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Err(ClientError::Prompt("not a terminal".into()))
        }
    }

    fn vault() -> DocumentVault {
        // Nothing listens on the discard port; any request would fail as transport.
        let api = Arc::new(ApiClient::new("http://127.0.0.1:9", None).unwrap());
        let cache = Arc::new(DocumentCache::open_in_memory().unwrap());
        DocumentVault::new(api, cache, 16)
    }

    #[tokio::test]
    async fn size_is_checked_again_after_reading() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grown.txt");
        std::fs::write(&path, "x".repeat(17)).unwrap();

        let err = read_upload(&path, 16).await.unwrap_err();
        assert!(err.is_validation());
        assert!(read_upload(&path, 17).await.is_ok());
    }

    #[tokio::test]
    async fn failed_prompt_fails_the_delete() {
        let err = vault().delete("doc-1", &NoTerminal).await.unwrap_err();
        assert!(matches!(err, ClientError::Prompt(_)));
    }

    #[tokio::test]
    async fn declined_prompt_cancels() {
        let outcome = vault().delete("doc-1", &AlwaysAnswer(false)).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Cancelled);
    }
}
