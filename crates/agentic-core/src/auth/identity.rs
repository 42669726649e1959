use serde::{Deserialize, Serialize};

/// The signed-in user. Conversations are keyed by `email`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
}

impl Identity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            picture: None,
            is_guest: false,
        }
    }

    /// A local guest identity. The same name always maps to the same email so
    /// a guest finds their conversations again.
    pub fn guest(name: &str) -> Self {
        let name = name.trim();
        let slug: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        Self {
            email: format!("guest-{}@guest.local", slug.trim_matches('-')),
            name: name.to_string(),
            picture: None,
            is_guest: true,
        }
    }

    /// First word of the display name, used in greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
