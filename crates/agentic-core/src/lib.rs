pub mod error;
pub mod llm;
pub mod store;
pub mod auth;
pub mod config;
pub mod report;
pub mod session;
pub mod specialist;

// Re-export key types
pub use error::AgenticError;
pub use llm::{CompletionClient, Content, GenerateOptions, Part, StreamEvent, TokenCount};
pub use store::{ConversationStore, FileBackend, KeyValueBackend, MemoryBackend};
pub use auth::{AuthProvider, Identity, SessionAuth};
pub use config::Settings;
pub use report::{HttpReportDispatcher, ReportDispatcher, ReportRequest};
pub use session::{
    Attachment, AttachmentStatus, ChatController, ChatEvent, Message, Role, SendOutcome,
    SessionSnapshot, TokenBudget,
};
pub use specialist::{Specialist, SpecialistRegistry};
