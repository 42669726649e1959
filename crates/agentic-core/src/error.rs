use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgenticError {
    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Attachment rejected: {name}: {reason}")]
    Attachment { name: String, reason: String },

    #[error("Specialist '{0}' is already processing a request")]
    Busy(String),

    #[error("Unknown specialist: {0}")]
    UnknownSpecialist(String),

    #[error("No signed-in user")]
    NotSignedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgenticError {
    pub fn attachment(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Attachment {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by user input rather than a collaborator failing.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Attachment { .. } | Self::Busy(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AgenticError>;
