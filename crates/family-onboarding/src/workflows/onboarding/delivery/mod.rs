pub mod drive;

use std::fmt;

pub use drive::GoogleDriveObjectStore;

/// Reference returned by the object store for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub file_id: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store operation failed: {0}")]
    Backend(String),
    #[error("object store runtime unavailable: {0}")]
    Runtime(String),
}

/// Cloud storage that files submitted archives under a folder path.
///
/// Implementations reuse an existing folder whose name matches a segment
/// exactly before creating a new one.
pub trait ObjectStore: Send + Sync {
    fn upload(
        &self,
        bytes: &[u8],
        folder_segments: &[String],
        filename: &str,
    ) -> Result<StoredObject, ObjectStoreError>;
}

#[derive(Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for EmailAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailAttachment")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
    #[error("email rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
}

/// Outbound email hook (SMTP relay, Gmail API, or a test recorder).
pub trait Notifier: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifierError>;
}
