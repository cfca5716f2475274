pub mod http;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_REPORT: &str = "text/csv, application/json";

/// Error code Graph returns for mailboxes that are on-premises or inactive.
pub const MAILBOX_NOT_ENABLED_CODE: &str = "MailboxNotEnabledForRESTAPI";

/// A response body as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpBody {
    pub content_type: Option<String>,
    pub text: String,
}

impl HttpBody {
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, GraphError> {
        serde_json::from_str(&self.text).map_err(|e| GraphError::Decode(e.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("HTTP {status}{}", format_code(.code, .message))]
    Status {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

fn format_code(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(c), Some(m)) => format!(" ({}): {}", c, m),
        (Some(c), None) => format!(" ({})", c),
        (None, Some(m)) => format!(": {}", m),
        (None, None) => String::new(),
    }
}

/// How a failed Graph call is treated by callers that tolerate partial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotEnabled,
    NotFound,
    AccessDenied,
    Unknown,
}

impl GraphError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GraphError::Status { status: 400, code, .. }
                if code.as_deref() == Some(MAILBOX_NOT_ENABLED_CODE) =>
            {
                FailureKind::NotEnabled
            }
            GraphError::Status { status: 404, .. } => FailureKind::NotFound,
            GraphError::Status { status: 403, .. } => FailureKind::AccessDenied,
            _ => FailureKind::Unknown,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GraphError::Status { status: 401 | 403, .. })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Build a `GraphError::Status` from a non-success status and its body.
/// Bodies in the `{"error": {"code", "message"}}` shape contribute their code.
pub fn status_error(status: u16, body: &str) -> GraphError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);
    match detail {
        Some(d) => GraphError::Status {
            status,
            code: d.code,
            message: d.message,
        },
        None => GraphError::Status {
            status,
            code: None,
            message: if body.trim().is_empty() {
                None
            } else {
                Some(body.trim().to_string())
            },
        },
    }
}

/// GET-only access to the directory API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpBody, GraphError>;
}

/// URL layout of the Graph endpoints used by a run.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
    report_period: String,
}

impl Endpoints {
    pub fn new(base_url: &str, report_period: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            report_period: report_period.to_string(),
        }
    }

    pub fn users(&self) -> String {
        format!(
            "{}/users?$select=id,displayName,userPrincipalName,mail",
            self.base_url
        )
    }

    pub fn profile(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}?$select=mail,mailboxSettings,displayName,userPrincipalName",
            self.base_url, user_id
        )
    }

    pub fn inbox(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}/mailFolders/Inbox?$select=unreadItemCount",
            self.base_url, user_id
        )
    }

    pub fn usage_report(&self) -> String {
        format!(
            "{}/reports/getMailboxUsageDetail(period='{}')",
            self.base_url, self.report_period
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, "D7")
    }
}

/// Validate that a resolved endpoint URL uses HTTPS.
///
/// Must be called for every configured endpoint before a bearer token is
/// attached to any request.
pub fn validate_endpoint(url: &str, label: &str) -> anyhow::Result<()> {
    if !url.starts_with("https://") {
        anyhow::bail!("{}: endpoint must use HTTPS, got: {}", label, url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_endpoint_accepts_https() {
        assert!(validate_endpoint("https://graph.microsoft.com/v1.0", "graph").is_ok());
    }

    #[test]
    fn validate_endpoint_rejects_http() {
        let err = validate_endpoint("http://evil.com", "graph").unwrap_err();
        assert!(err.to_string().contains("must use HTTPS"));
    }

    #[test]
    fn validate_endpoint_rejects_no_scheme() {
        assert!(validate_endpoint("graph.microsoft.com/v1.0", "graph").is_err());
    }

    #[test]
    fn status_error_reads_graph_envelope() {
        let body = r#"{"error":{"code":"MailboxNotEnabledForRESTAPI","message":"REST API is not yet supported for this mailbox."}}"#;
        let err = status_error(400, body);
        assert_eq!(err.kind(), FailureKind::NotEnabled);
        assert!(err.to_string().contains("MailboxNotEnabledForRESTAPI"));
    }

    #[test]
    fn status_error_keeps_plain_body_as_message() {
        let err = status_error(502, "Bad Gateway");
        assert_eq!(
            err,
            GraphError::Status {
                status: 502,
                code: None,
                message: Some("Bad Gateway".into()),
            }
        );
        assert_eq!(err.kind(), FailureKind::Unknown);
    }

    #[test]
    fn kind_classification() {
        assert_eq!(status_error(404, "").kind(), FailureKind::NotFound);
        assert_eq!(status_error(403, "").kind(), FailureKind::AccessDenied);
        // 400 without the mailbox code is not "not enabled"
        assert_eq!(status_error(400, "").kind(), FailureKind::Unknown);
        assert_eq!(
            GraphError::Transport("connection reset".into()).kind(),
            FailureKind::Unknown
        );
    }

    #[test]
    fn unauthorized_covers_401_and_403() {
        assert!(status_error(401, "").is_unauthorized());
        assert!(status_error(403, "").is_unauthorized());
        assert!(!status_error(500, "").is_unauthorized());
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        let e = Endpoints::new("https://graph.example.com/v1.0/", "D30");
        assert_eq!(
            e.usage_report(),
            "https://graph.example.com/v1.0/reports/getMailboxUsageDetail(period='D30')"
        );
        assert_eq!(
            e.inbox("abc"),
            "https://graph.example.com/v1.0/users/abc/mailFolders/Inbox?$select=unreadItemCount"
        );
    }
}
