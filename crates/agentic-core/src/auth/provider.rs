use crate::auth::exchange::{TokenExchangeClient, TokenExchangeRequest};
use crate::auth::Identity;
use crate::error::{AgenticError, Result};
use std::time::Duration;
use tokio::sync::watch;

/// Bound on waiting for the first identity before assuming nobody is signed in.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the current identity and of identity transitions.
///
/// Subscribers receive a `watch` receiver; dropping it unsubscribes.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<Identity>;
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
    fn sign_in(&self, identity: Identity);
    fn sign_in_as_guest(&self, name: &str) -> Result<Identity>;
    fn sign_out(&self);
}

/// Identity holder that broadcasts every transition to its subscribers.
pub struct SessionAuth {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionAuth {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Finish the OAuth redirect: exchange the authorization code for tokens
    /// and sign in as the returned user.
    pub async fn complete_sign_in(
        &self,
        client: &TokenExchangeClient,
        request: &TokenExchangeRequest,
    ) -> Result<Identity> {
        let tokens = client.exchange(request).await?;
        let identity = tokens.identity()?;
        self.sign_in(identity.clone());
        Ok(identity)
    }
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for SessionAuth {
    fn current_user(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    fn sign_in(&self, identity: Identity) {
        tracing::info!("Signed in as {}", identity.email);
        self.tx.send_replace(Some(identity));
    }

    fn sign_in_as_guest(&self, name: &str) -> Result<Identity> {
        if name.trim().is_empty() {
            return Err(AgenticError::Validation(
                "Please enter a name to continue as guest".to_string(),
            ));
        }
        let identity = Identity::guest(name);
        self.sign_in(identity.clone());
        Ok(identity)
    }

    fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            tracing::info!("Signed out {}", previous.email);
        }
    }
}

/// Wait for the first known identity, giving up after `timeout`.
///
/// A stall degrades to "no identity" instead of an error.
pub async fn resolve_initial_identity(
    mut rx: watch::Receiver<Option<Identity>>,
    timeout: Duration,
) -> Option<Identity> {
    if let Some(identity) = rx.borrow_and_update().clone() {
        return Some(identity);
    }

    let wait = async {
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            if let Some(identity) = rx.borrow_and_update().clone() {
                return Some(identity);
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(identity) => identity,
        Err(_) => {
            tracing::warn!(
                "Identity not resolved within {:?}, continuing signed out",
                timeout
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_out_notifies_subscribers() {
        let auth = SessionAuth::new();
        let mut rx = auth.subscribe();
        assert!(auth.current_user().is_none());

        auth.sign_in(Identity::new("ada@example.com", "Ada"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|i| i.email.as_str()),
            Some("ada@example.com")
        );

        auth.sign_out();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_guest_requires_name() {
        let auth = SessionAuth::new();
        assert!(auth.sign_in_as_guest("   ").is_err());
        assert!(auth.current_user().is_none());

        let guest = auth.sign_in_as_guest("Ada").unwrap();
        assert_eq!(auth.current_user(), Some(guest));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_times_out_to_none() {
        let auth = SessionAuth::new();
        let resolved = resolve_initial_identity(auth.subscribe(), DEFAULT_RESOLVE_TIMEOUT).await;
        assert!(resolved.is_none());
    }

    /// Answer one HTTP request with `body` and hand back what was received.
    async fn serve_once(body: &'static str) -> (String, tokio::sync::oneshot::Receiver<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let _ = seen_tx.send(String::from_utf8_lossy(&request).to_string());
        });
        (format!("http://{addr}"), seen_rx)
    }

    #[tokio::test]
    async fn test_complete_sign_in_notifies_subscribers() {
        let (base_url, seen) = serve_once(
            r#"{"access_token":"t","expires_in":3599,
                "user_info":{"email":"ada@example.com","name":"Ada Lovelace"}}"#,
        )
        .await;

        let auth = SessionAuth::new();
        let mut rx = auth.subscribe();
        let client = TokenExchangeClient::new(base_url);
        let request = TokenExchangeRequest {
            code: "auth-code".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            client_id: "client-123".to_string(),
            code_verifier: "verifier".to_string(),
        };

        let identity = auth.complete_sign_in(&client, &request).await.unwrap();
        assert_eq!(identity.email, "ada@example.com");
        assert!(!identity.is_guest);

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&identity));
        assert_eq!(auth.current_user(), Some(identity));

        let request = seen.await.unwrap();
        assert!(request.starts_with("POST /api/auth/token "));
        assert!(request.contains(r#""client_id":"client-123""#));
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_identity_unchanged() {
        let (base_url, _seen) = serve_once(r#"{"access_token":"t"}"#).await;

        let auth = SessionAuth::new();
        auth.sign_in_as_guest("Ada").unwrap();
        let mut rx = auth.subscribe();
        let client = TokenExchangeClient::new(base_url);
        let request = TokenExchangeRequest {
            code: "auth-code".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            client_id: "client-123".to_string(),
            code_verifier: "verifier".to_string(),
        };

        assert!(auth.complete_sign_in(&client, &request).await.is_err());
        assert!(!rx.has_changed().unwrap());
        assert!(auth.current_user().is_some_and(|i| i.is_guest));
    }

    #[tokio::test]
    async fn test_resolve_returns_late_identity() {
        let auth = std::sync::Arc::new(SessionAuth::new());
        let rx = auth.subscribe();
        let signer = auth.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signer.sign_in(Identity::new("ada@example.com", "Ada"));
        });

        let resolved = resolve_initial_identity(rx, Duration::from_secs(5)).await;
        assert_eq!(resolved.map(|i| i.name), Some("Ada".to_string()));
    }
}
