use crate::error::{AgenticError, Result};
use crate::session::AttachmentMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of trailing assistant messages summarized in a report.
pub const REPORT_MESSAGE_WINDOW: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Conversation excerpt sent to the report backend as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisPayload {
    pub specialist: String,
    pub messages: Vec<AnalysisMessage>,
    pub attachments: Vec<AttachmentMeta>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub specialist_id: String,
    pub customer_request: Option<String>,
    pub user_email: String,
    pub analysis: AnalysisPayload,
}

impl ReportRequest {
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("specialist_type", self.specialist_id.clone()),
            (
                "customer_request",
                self.customer_request.clone().unwrap_or_default(),
            ),
            ("user_email", self.user_email.clone()),
            ("analysis_data", serde_json::to_string(&self.analysis)?),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRef {
    pub report_id: String,
}

/// Response body of the report backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEnvelope {
    pub status: String,
    #[serde(default)]
    pub report: Option<ReportRef>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReportEnvelope {
    /// The report id when the backend reported success.
    pub fn report_id(&self) -> Option<&str> {
        if self.status == "success" {
            self.report.as_ref().map(|r| r.report_id.as_str())
        } else {
            None
        }
    }

    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("report service returned status '{}'", self.status))
    }
}

/// Sends a finished conversation to the report backend. One attempt, no retry.
#[async_trait::async_trait]
pub trait ReportDispatcher: Send + Sync {
    async fn dispatch(&self, request: &ReportRequest) -> Result<ReportEnvelope>;

    fn preview_url(&self, report_id: &str) -> String;
}

pub struct HttpReportDispatcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ReportDispatcher for HttpReportDispatcher {
    async fn dispatch(&self, request: &ReportRequest) -> Result<ReportEnvelope> {
        let url = format!("{}/api/reports/generate", self.base_url);
        let fields = request.form_fields()?;

        let response = self.client.post(&url).form(&fields).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ReportEnvelope>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(AgenticError::Report(format!(
                "Report service error ({}): {}",
                status, text
            ))),
            Err(e) => Err(AgenticError::Report(format!(
                "Failed to parse report response: {e}"
            ))),
        }
    }

    fn preview_url(&self, report_id: &str) -> String {
        format!("{}/api/reports/preview/{}.html", self.base_url, report_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReportRequest {
        ReportRequest {
            specialist_id: "business-analyst".to_string(),
            customer_request: None,
            user_email: "ada@example.com".to_string(),
            analysis: AnalysisPayload {
                specialist: "Business Analyst".to_string(),
                messages: vec![AnalysisMessage {
                    content: "Revenue grew 12%".to_string(),
                    timestamp: None,
                }],
                attachments: vec![],
                generated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_form_fields() {
        let fields = request().form_fields().unwrap();
        let names: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec!["specialist_type", "customer_request", "user_email", "analysis_data"]
        );
        assert_eq!(fields[1].1, "");
        let analysis: AnalysisPayload = serde_json::from_str(&fields[3].1).unwrap();
        assert_eq!(analysis.messages[0].content, "Revenue grew 12%");
    }

    #[test]
    fn test_envelope_success_and_failure() {
        let ok: ReportEnvelope =
            serde_json::from_str(r#"{"status":"success","report":{"report_id":"r-1"}}"#).unwrap();
        assert_eq!(ok.report_id(), Some("r-1"));

        let failed: ReportEnvelope =
            serde_json::from_str(r#"{"status":"error","message":"boom"}"#).unwrap();
        assert_eq!(failed.report_id(), None);
        assert_eq!(failed.error_message(), "boom");

        let bare: ReportEnvelope = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert!(bare.error_message().contains("queued"));
    }

    #[test]
    fn test_preview_url() {
        let dispatcher = HttpReportDispatcher::new("https://reports.example.com/");
        assert_eq!(
            dispatcher.preview_url("r-1"),
            "https://reports.example.com/api/reports/preview/r-1.html"
        );
    }
}
