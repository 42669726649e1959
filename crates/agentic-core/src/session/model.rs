use crate::llm::{CompletionRole, Content};
use crate::session::attachment::Attachment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn completion_role(self) -> CompletionRole {
        match self {
            Role::User => CompletionRole::User,
            Role::Assistant => CompletionRole::Model,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            specialist_id: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            specialist_id: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_specialist(mut self, specialist_id: impl Into<String>) -> Self {
        self.specialist_id = Some(specialist_id.into());
        self
    }

    pub fn to_content(&self) -> Content {
        Content {
            role: self.role.completion_role(),
            parts: vec![crate::llm::Part::text(&self.content)],
        }
    }
}

/// A labelled context category the user can switch on or off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSourceToggle {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DataSourceFlags {
    sources: Vec<DataSourceToggle>,
}

impl DataSourceFlags {
    pub const DEFAULT_LABELS: [&'static str; 4] = [
        "Uploaded Documents",
        "Company Knowledge Base",
        "Industry Reports",
        "Web Search",
    ];

    pub fn new(labels: &[&str]) -> Self {
        Self {
            sources: labels
                .iter()
                .map(|label| DataSourceToggle {
                    label: label.to_string(),
                    enabled: false,
                })
                .collect(),
        }
    }

    /// Sets a toggle, adding it if the label is new. Returns the previous state.
    pub fn set(&mut self, label: &str, enabled: bool) -> bool {
        match self.sources.iter_mut().find(|s| s.label == label) {
            Some(source) => std::mem::replace(&mut source.enabled, enabled),
            None => {
                self.sources.push(DataSourceToggle {
                    label: label.to_string(),
                    enabled,
                });
                false
            }
        }
    }

    pub fn is_enabled(&self, label: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s.label == label && s.enabled)
    }

    pub fn enabled_labels(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.label.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataSourceToggle> {
        self.sources.iter()
    }

    /// The declarative line prefixed to every outgoing prompt.
    pub fn context_line(&self) -> String {
        let enabled = self.enabled_labels();
        if enabled.is_empty() {
            "Context: no additional data sources are enabled.".to_string()
        } else {
            format!("Context: use the following data sources: {}.", enabled.join(", "))
        }
    }
}

impl Default for DataSourceFlags {
    fn default() -> Self {
        Self::new(&Self::DEFAULT_LABELS)
    }
}

/// Per-user UI state restored on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub selected_specialist: String,
    pub data_sources: DataSourceFlags,
    pub attachments: Vec<Attachment>,
}

/// Cumulative, display-only estimate of token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    used: u64,
    limit: u64,
}

impl TokenBudget {
    pub const DEFAULT_LIMIT: u64 = 1_000_000;

    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    pub fn add(&mut self, tokens: u64) {
        self.used = self.used.saturating_add(tokens);
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    pub fn is_exceeded(&self) -> bool {
        self.used > self.limit
    }

    pub fn percent_used(&self) -> f64 {
        if self.limit == 0 {
            return 100.0;
        }
        (self.used as f64 / self.limit as f64) * 100.0
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

/// An entry in the recent-queries side log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRecord {
    pub query: String,
    pub specialist_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Where a specialist conversation sits in the request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
    LoadingEstimate,
    Streaming,
}

impl Phase {
    pub fn is_active(self) -> bool {
        self != Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_maps_to_completion_vocabulary() {
        assert_eq!(Message::user("q").to_content().role, CompletionRole::User);
        assert_eq!(Message::assistant("a").to_content().role, CompletionRole::Model);
    }

    #[test]
    fn test_context_line_lists_enabled_in_declared_order() {
        let mut flags = DataSourceFlags::default();
        assert_eq!(
            flags.context_line(),
            "Context: no additional data sources are enabled."
        );

        flags.set("Web Search", true);
        flags.set("Uploaded Documents", true);
        assert_eq!(
            flags.context_line(),
            "Context: use the following data sources: Uploaded Documents, Web Search."
        );
    }

    #[test]
    fn test_data_source_set_returns_previous() {
        let mut flags = DataSourceFlags::default();
        assert!(!flags.set("Web Search", true));
        assert!(flags.set("Web Search", false));
        assert!(!flags.is_enabled("Web Search"));

        assert!(!flags.set("Custom", true));
        assert!(flags.is_enabled("Custom"));
    }

    #[test]
    fn test_token_budget_never_blocks_and_saturates() {
        let mut budget = TokenBudget::new(10);
        budget.add(7);
        budget.add(7);
        assert_eq!(budget.used(), 14);
        assert!(budget.is_exceeded());
        assert_eq!(budget.remaining(), 0);

        budget.add(u64::MAX);
        assert_eq!(budget.used(), u64::MAX);
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::assistant("hi").with_specialist("analyst");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["specialistId"], "analyst");
        assert!(json.get("createdAt").is_some());
    }
}
