use azure_core::error::ErrorKind;
use thiserror::Error;

/// Longest service message surfaced to callers, in characters.
const MAX_MESSAGE_CHARS: usize = 200;

/// Errors raised while acquiring Azure credentials or talking to Azure services.
#[derive(Debug, Error)]
pub enum AzureError {
    /// No credential source could produce a token.
    #[error("{0}")]
    Credential(String),

    /// The Azure service answered with a non-success status.
    #[error("{status} {code}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Azure error code (e.g. `"BlobNotFound"`).
        code: String,
        /// First line of the service message, truncated.
        message: String,
    },

    /// Any other SDK failure (transport, decoding, ...).
    #[error("Azure request failed: {0}")]
    Request(String),

    /// Configuration is incomplete or inconsistent.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<azure_core::Error> for AzureError {
    fn from(err: azure_core::Error) -> Self {
        match err.kind() {
            ErrorKind::HttpResponse {
                status, error_code, ..
            } => Self::Service {
                status: u16::from(*status),
                code: error_code.clone().unwrap_or_else(|| "Error".to_owned()),
                message: summarize(&err.to_string()),
            },
            ErrorKind::Credential => Self::Credential(err.to_string()),
            _ => Self::Request(summarize(&err.to_string())),
        }
    }
}

/// Reduce an SDK error message to something fit for a JSON `error` field.
///
/// Service errors can carry a whole response body (sometimes an HTML page);
/// only the first non-empty line is kept and it is cut at
/// [`MAX_MESSAGE_CHARS`].
pub(crate) fn summarize(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    if line.chars().count() <= MAX_MESSAGE_CHARS {
        return line.to_owned();
    }
    let mut cut: String = line.chars().take(MAX_MESSAGE_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_keeps_first_line() {
        let text = "The specified blob does not exist.\nRequestId:abc\nTime:2026-01-01T00:00:00Z";
        assert_eq!(summarize(text), "The specified blob does not exist.");
    }

    #[test]
    fn summarize_truncates_html_pages() {
        let page = format!(
            "\n<!DOCTYPE html><html><body>{}</body></html>\n<footer/>",
            "x".repeat(5_000)
        );
        let message = summarize(&page);
        assert!(message.starts_with("<!DOCTYPE html>"));
        assert!(message.ends_with("..."));
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS + 3);
    }

    #[test]
    fn summarize_empty_body() {
        assert_eq!(summarize("  \n \n"), "");
    }

    #[test]
    fn credential_errors_keep_their_text() {
        let err: AzureError = azure_core::Error::new(
            ErrorKind::Credential,
            "DefaultAzureCredential failed to retrieve a token: EnvironmentCredential: not configured",
        )
        .into();
        assert!(matches!(err, AzureError::Credential(_)));
        assert!(err.to_string().contains("EnvironmentCredential: not configured"));
    }

    #[test]
    fn other_sdk_errors_map_to_request() {
        let err: AzureError = azure_core::Error::new(ErrorKind::Io, "connection refused").into();
        assert!(matches!(err, AzureError::Request(_)));
        assert!(err.to_string().starts_with("Azure request failed"));
    }

    #[test]
    fn configuration_display() {
        let err = AzureError::Configuration("AZURE_STORAGE_ACCOUNT is not configured".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: AZURE_STORAGE_ACCOUNT is not configured"
        );
    }
}
