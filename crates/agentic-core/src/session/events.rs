use crate::auth::Identity;
use crate::session::attachment::AttachmentStatus;
use crate::session::model::{Message, Phase, TokenBudget};

/// Notifications for the view layer. Every state change the controller makes
/// is announced here, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    IdentityChanged(Option<Identity>),
    SpecialistSelected(String),
    MessageAppended {
        specialist_id: String,
        message: Message,
    },
    /// The streaming tail message grew; `content` is its full text so far.
    MessageUpdated {
        specialist_id: String,
        content: String,
    },
    PhaseChanged {
        specialist_id: String,
        phase: Phase,
    },
    TokenBudgetChanged(TokenBudget),
    AttachmentUpdated {
        id: String,
        name: String,
        status: AttachmentStatus,
        progress: u8,
    },
    AttachmentRemoved(String),
    AttachmentRejected(String),
    DataSourcesChanged,
    ReportStatusChanged {
        generating: bool,
    },
    HistoryCleared,
    Error {
        specialist_id: String,
        message: String,
    },
}
