mod identity;
mod provider;
pub mod exchange;

pub use identity::Identity;
pub use provider::{resolve_initial_identity, AuthProvider, SessionAuth, DEFAULT_RESOLVE_TIMEOUT};
pub use exchange::{TokenExchangeClient, TokenExchangeRequest, TokenResponse, UserInfo};
