mod attachment;
mod controller;
mod events;
mod model;
pub mod reducer;

pub use attachment::{
    check_capacity, check_size, guess_mime_type, read_attachment, Attachment, AttachmentMeta,
    AttachmentStatus, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES, PROCESSING_DELAY, PROGRESS_INTERVAL,
    PROGRESS_STEP,
};
pub use controller::{
    AttachOutcome, ChatController, ChatControllerBuilder, ReportOutcome, SendOutcome,
    APOLOGY_MESSAGE, QUERY_HISTORY_LIMIT,
};
pub use events::ChatEvent;
pub use model::{
    DataSourceFlags, DataSourceToggle, Message, Phase, QueryRecord, Role, SessionSnapshot,
    TokenBudget,
};
pub use reducer::append_or_merge_last;
