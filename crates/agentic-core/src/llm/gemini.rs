use crate::error::AgenticError;
use crate::llm::traits::*;
use futures::channel::mpsc;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    fn build_request_body(contents: &[Content], options: &GenerateOptions) -> Value {
        let mut body = serde_json::json!({ "contents": contents });
        if let Some(ref instruction) = options.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": instruction }]
            });
        }
        body
    }
}

/// Extract the text carried by one SSE `data:` payload. Returns `None` for
/// payloads without candidate text (usage-only frames, safety metadata).
pub(crate) fn parse_stream_payload(data: &str) -> Option<String> {
    let event: Value = serde_json::from_str(data).ok()?;
    let parts = event
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Splits a byte stream into lines. Bytes are only decoded once a whole line
/// is buffered, so a multi-byte character split across chunks survives.
#[derive(Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }

    /// The trailing line when the stream ends without a newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        Some(line)
    }
}

/// Forward one SSE line. Returns false once the stream reported an error.
fn forward_line(tx: &mpsc::UnboundedSender<StreamEvent>, line: &str) -> bool {
    let Some(data) = line.strip_prefix("data:") else {
        return true;
    };
    let data = data.trim();

    if let Ok(event) = serde_json::from_str::<Value>(data) {
        if let Some(message) = event
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            let _ = tx.unbounded_send(StreamEvent::Error(message.to_string()));
            return false;
        }
    }

    if let Some(text) = parse_stream_payload(data) {
        let _ = tx.unbounded_send(StreamEvent::TextDelta(text));
    }
    true
}

#[async_trait::async_trait]
impl CompletionClient for GeminiClient {
    async fn count_tokens(
        &self,
        model: &str,
        contents: &[Content],
    ) -> Result<TokenCount, AgenticError> {
        let url = self.model_url(model, "countTokens");
        let body = serde_json::json!({ "contents": contents });

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(AgenticError::Completion(format!(
                "countTokens failed ({}): {}",
                status, response_text
            )));
        }

        serde_json::from_str(&response_text)
            .map_err(|e| AgenticError::Completion(format!("Failed to parse token count: {e}")))
    }

    async fn stream_generate(
        &self,
        model: &str,
        contents: &[Content],
        options: &GenerateOptions,
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, AgenticError> {
        let url = self.model_url(model, "streamGenerateContent");
        let body = Self::build_request_body(contents, options);

        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgenticError::Completion(format!(
                "streamGenerateContent failed ({}): {}",
                status, text
            )));
        }

        let (tx, rx) = mpsc::unbounded();

        let mut stream = response.bytes_stream();
        tokio::spawn(async move {
            use futures::StreamExt;
            let mut lines = SseLineBuffer::default();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                        return;
                    }
                };

                for line in lines.push(&chunk) {
                    if !forward_line(&tx, &line) {
                        return;
                    }
                }
            }

            if let Some(line) = lines.finish() {
                if !forward_line(&tx, &line) {
                    return;
                }
            }
            let _ = tx.unbounded_send(StreamEvent::Done);
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_payload_joins_parts() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi"},{"text":" there"}]}}]}"#;
        assert_eq!(parse_stream_payload(data), Some("Hi there".to_string()));
    }

    #[test]
    fn test_parse_stream_payload_ignores_usage_frames() {
        let data = r#"{"usageMetadata":{"promptTokenCount":3}}"#;
        assert_eq!(parse_stream_payload(data), None);
        assert_eq!(parse_stream_payload("not json"), None);
    }

    #[test]
    fn test_request_body_carries_system_instruction() {
        let contents = vec![Content::user("hello")];
        let body = GeminiClient::build_request_body(
            &contents,
            &GenerateOptions::with_system_instruction("Be brief."),
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");

        let plain = GeminiClient::build_request_body(&contents, &GenerateOptions::default());
        assert!(plain.get("systemInstruction").is_none());
    }

    #[test]
    fn test_line_buffer_keeps_split_multibyte_characters() {
        let line = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"café 😀\"}]}}]}\n";
        let bytes = line.as_bytes();
        // Split inside the two-byte encoding of 'é'.
        let split = line.find('é').unwrap() + 1;

        let mut buffer = SseLineBuffer::default();
        assert!(buffer.push(&bytes[..split]).is_empty());
        let lines = buffer.push(&bytes[split..]);
        assert_eq!(lines.len(), 1);
        let data = lines[0].strip_prefix("data:").unwrap().trim();
        assert_eq!(parse_stream_payload(data), Some("café 😀".to_string()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_flushes_unterminated_tail() {
        let mut buffer = SseLineBuffer::default();
        assert_eq!(buffer.push(b"data: a\r\ndata: b"), vec!["data: a".to_string()]);
        assert_eq!(buffer.finish(), Some("data: b".to_string()));
    }

    #[tokio::test]
    async fn test_stream_generate_reassembles_chunks() {
        use futures::StreamExt;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the whole request before answering.
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

            let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"café 😀\"}]}}]}\n\n";
            let split = body.find('é').unwrap() + 1;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            socket.write_all(&body.as_bytes()[..split]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            socket.write_all(&body.as_bytes()[split..]).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let client = GeminiClient::new("k").with_base_url(format!("http://{addr}"));
        let mut rx = client
            .stream_generate(
                "gemini-2.5-flash",
                &[Content::user("hi")],
                &GenerateOptions::default(),
            )
            .await
            .unwrap();

        let mut text = String::new();
        while let Some(event) = rx.next().await {
            match event {
                StreamEvent::TextDelta(delta) => text.push_str(&delta),
                StreamEvent::Done => break,
                StreamEvent::Error(e) => panic!("unexpected stream error: {e}"),
            }
        }
        assert_eq!(text, "café 😀");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GeminiClient::new("k").with_base_url("http://localhost:8080/");
        assert_eq!(
            client.model_url("gemini-2.5-flash", "countTokens"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:countTokens"
        );
    }
}
