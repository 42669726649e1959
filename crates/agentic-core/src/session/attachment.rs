use crate::error::{AgenticError, Result};
use crate::llm::Part;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Progress added per simulated upload tick.
pub const PROGRESS_STEP: u8 = 20;
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
/// Delay between `processing` and `ready`.
pub const PROCESSING_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Uploading,
    Processing,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default = "new_attachment_id")]
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Base64-encoded file contents.
    pub data: String,
    pub status: AttachmentStatus,
    pub progress: u8,
}

fn new_attachment_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Attachment description without the payload, sent with report requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl Attachment {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            id: new_attachment_id(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            data: BASE64_STANDARD.encode(bytes),
            status: AttachmentStatus::Uploading,
            progress: 0,
        }
    }

    /// Apply one tick of the simulated upload. Returns false once `ready`.
    ///
    /// Status only ever moves forward: uploading -> processing -> ready.
    pub fn advance(&mut self) -> bool {
        match self.status {
            AttachmentStatus::Uploading => {
                self.progress = self.progress.saturating_add(PROGRESS_STEP).min(100);
                if self.progress == 100 {
                    self.status = AttachmentStatus::Processing;
                }
                true
            }
            AttachmentStatus::Processing => {
                self.status = AttachmentStatus::Ready;
                true
            }
            AttachmentStatus::Ready => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == AttachmentStatus::Ready
    }

    pub fn to_part(&self) -> Part {
        Part::inline(&self.mime_type, &self.data)
    }

    pub fn meta(&self) -> AttachmentMeta {
        AttachmentMeta {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
        }
    }
}

/// Check that `incoming` more files fit next to `existing` ones.
pub fn check_capacity(existing: usize, incoming: usize) -> Result<()> {
    if existing + incoming > MAX_ATTACHMENTS {
        return Err(AgenticError::Validation(format!(
            "You can attach at most {} files ({} already attached)",
            MAX_ATTACHMENTS, existing
        )));
    }
    Ok(())
}

pub fn check_size(name: &str, size: u64) -> Result<()> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AgenticError::attachment(
            name,
            format!(
                "file is {:.1} MB, the limit is {} MB",
                size as f64 / (1024.0 * 1024.0),
                MAX_ATTACHMENT_BYTES / (1024 * 1024)
            ),
        ));
    }
    Ok(())
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Read a file fully into a new `uploading` attachment.
pub async fn read_attachment(path: &Path) -> Result<Attachment> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AgenticError::attachment(&name, format!("could not read file: {e}")))?;
    check_size(&name, metadata.len())?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AgenticError::attachment(&name, format!("could not read file: {e}")))?;
    // The file may have grown between the stat and the read.
    check_size(&name, bytes.len() as u64)?;

    Ok(Attachment::from_bytes(name, guess_mime_type(path), &bytes))
}
