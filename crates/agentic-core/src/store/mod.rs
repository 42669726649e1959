mod backend;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};

use crate::auth::Identity;
use crate::error::{AgenticError, Result};
use crate::session::{Attachment, DataSourceFlags, Message, SessionSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CHAT_PREFIX: &str = "chat:";
const SESSION_PREFIX: &str = "session:";

/// Persisted conversation log for one (user, specialist) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub user_email: String,
    pub specialist_id: String,
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

/// Persisted session snapshot for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_email: String,
    pub user_name: String,
    pub selected_specialist: String,
    pub data_source_flags: DataSourceFlags,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub last_session: DateTime<Utc>,
}

fn chat_prefix(user_email: &str) -> String {
    format!("{CHAT_PREFIX}{user_email}:")
}

fn chat_key(user_email: &str, specialist_id: &str) -> String {
    format!("{}{}", chat_prefix(user_email), specialist_id)
}

fn session_key(user_email: &str) -> String {
    format!("{SESSION_PREFIX}{user_email}")
}

/// Mirrors conversation logs and session snapshots into a key-value backend.
pub struct ConversationStore {
    backend: Box<dyn KeyValueBackend>,
}

impl ConversationStore {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Overwrite the stored log for (user, specialist) with `messages`.
    pub fn save(&self, user_email: &str, specialist_id: &str, messages: &[Message]) -> Result<()> {
        let record = ChatRecord {
            user_email: user_email.to_string(),
            specialist_id: specialist_id.to_string(),
            messages: messages.to_vec(),
            last_updated: Utc::now(),
            message_count: messages.len(),
        };
        let contents = serde_json::to_string(&record).map_err(|e| {
            AgenticError::Storage(format!("Failed to serialize conversation: {}", e))
        })?;
        self.backend.set(&chat_key(user_email, specialist_id), &contents)
    }

    /// Every stored log for the user, keyed by specialist id.
    ///
    /// Never fails: unreadable or malformed records are skipped.
    pub fn load_all(&self, user_email: &str) -> BTreeMap<String, Vec<Message>> {
        let mut logs = BTreeMap::new();

        let keys = match self.backend.keys_with_prefix(&chat_prefix(user_email)) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Failed to list conversations for {}: {}", user_email, e);
                return logs;
            }
        };

        for key in keys {
            let contents = match self.backend.get(&key) {
                Ok(Some(contents)) => contents,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping unreadable conversation {}: {}", key, e);
                    continue;
                }
            };
            match serde_json::from_str::<ChatRecord>(&contents) {
                Ok(record) if record.user_email == user_email => {
                    logs.insert(record.specialist_id, record.messages);
                }
                Ok(_) => {
                    tracing::warn!("Skipping conversation {} stored under another user", key);
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed conversation {}: {}", key, e);
                }
            }
        }

        logs
    }

    pub fn save_session(&self, user: &Identity, snapshot: &SessionSnapshot) -> Result<()> {
        let record = SessionRecord {
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            selected_specialist: snapshot.selected_specialist.clone(),
            data_source_flags: snapshot.data_sources.clone(),
            attachments: snapshot.attachments.clone(),
            last_session: Utc::now(),
        };
        let contents = serde_json::to_string(&record)
            .map_err(|e| AgenticError::Storage(format!("Failed to serialize session: {}", e)))?;
        self.backend.set(&session_key(&user.email), &contents)
    }

    pub fn load_session(&self, user_email: &str) -> Option<SessionSnapshot> {
        let contents = match self.backend.get(&session_key(user_email)) {
            Ok(contents) => contents?,
            Err(e) => {
                tracing::warn!("Failed to read session for {}: {}", user_email, e);
                return None;
            }
        };
        match serde_json::from_str::<SessionRecord>(&contents) {
            Ok(record) => Some(SessionSnapshot {
                selected_specialist: record.selected_specialist,
                data_sources: record.data_source_flags,
                attachments: record.attachments,
            }),
            Err(e) => {
                tracing::warn!("Ignoring malformed session for {}: {}", user_email, e);
                None
            }
        }
    }

    /// Remove every log and the session snapshot of one user.
    pub fn clear(&self, user_email: &str) -> Result<()> {
        for key in self.backend.keys_with_prefix(&chat_prefix(user_email))? {
            self.backend.remove(&key)?;
        }
        self.backend.remove(&session_key(user_email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AttachmentStatus;

    fn ada() -> Identity {
        Identity::new("ada@example.com", "Ada")
    }

    #[test]
    fn test_save_overwrites_and_load_all_round_trips() {
        let store = ConversationStore::in_memory();
        let first = vec![Message::user("hello")];
        let second = vec![Message::user("hello"), Message::assistant("Hi there")];

        store.save("ada@example.com", "analyst", &first).unwrap();
        store.save("ada@example.com", "analyst", &second).unwrap();
        store.save("ada@example.com", "legal", &first).unwrap();

        let logs = store.load_all("ada@example.com");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs["analyst"], second);
        assert_eq!(logs["legal"], first);
    }

    #[test]
    fn test_load_all_empty_for_unknown_user() {
        let store = ConversationStore::in_memory();
        assert!(store.load_all("nobody@example.com").is_empty());
        assert!(store.load_session("nobody@example.com").is_none());
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let backend = MemoryBackend::new();
        backend
            .set(&chat_key("ada@example.com", "broken"), "{not json")
            .unwrap();
        let store = ConversationStore::new(backend);
        store
            .save("ada@example.com", "analyst", &[Message::user("q")])
            .unwrap();

        let logs = store.load_all("ada@example.com");
        assert_eq!(logs.len(), 1);
        assert!(logs.contains_key("analyst"));
    }

    #[test]
    fn test_malformed_session_is_ignored() {
        let backend = MemoryBackend::new();
        backend
            .set(&session_key("ada@example.com"), "{\"selectedSpecialist\":")
            .unwrap();
        let store = ConversationStore::new(backend);
        store
            .save("ada@example.com", "analyst", &[Message::user("q")])
            .unwrap();

        assert!(store.load_session("ada@example.com").is_none());
        assert_eq!(store.load_all("ada@example.com").len(), 1);
    }

    #[test]
    fn test_clear_only_touches_one_user() {
        let store = ConversationStore::in_memory();
        let snapshot = SessionSnapshot {
            selected_specialist: "analyst".to_string(),
            data_sources: DataSourceFlags::default(),
            attachments: vec![],
        };
        store.save("ada@example.com", "analyst", &[Message::user("a")]).unwrap();
        store.save("bob@example.com", "analyst", &[Message::user("b")]).unwrap();
        store.save_session(&ada(), &snapshot).unwrap();

        store.clear("ada@example.com").unwrap();

        assert!(store.load_all("ada@example.com").is_empty());
        assert!(store.load_session("ada@example.com").is_none());
        assert_eq!(store.load_all("bob@example.com").len(), 1);
    }

    #[test]
    fn test_session_last_write_wins() {
        let store = ConversationStore::in_memory();
        let mut attachment = Attachment::from_bytes("a.txt", "text/plain", b"x");
        while attachment.advance() {}

        let mut snapshot = SessionSnapshot {
            selected_specialist: "analyst".to_string(),
            data_sources: DataSourceFlags::default(),
            attachments: vec![attachment],
        };
        store.save_session(&ada(), &snapshot).unwrap();
        snapshot.selected_specialist = "legal".to_string();
        snapshot.data_sources.set("Web Search", true);
        store.save_session(&ada(), &snapshot).unwrap();

        let loaded = store.load_session("ada@example.com").unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.attachments[0].status, AttachmentStatus::Ready);
    }

    #[test]
    fn test_user_with_prefix_email_does_not_leak() {
        let store = ConversationStore::in_memory();
        store.save("a@x.io", "analyst", &[Message::user("mine")]).unwrap();
        store.save("a@x.io:evil", "analyst", &[Message::user("theirs")]).unwrap();

        let logs = store.load_all("a@x.io");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs["analyst"][0].content, "mine");
    }
}
