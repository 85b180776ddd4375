use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

const CREDENTIAL_SIGNATURES: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "requested entity was not found",
    "permission",
    "401",
    "unauthorized",
    "invalid api key",
    "authentication",
    "api key not set",
];

const QUOTA_SIGNATURES: &[&str] = &[
    "quota",
    "rate limit",
    "429",
    "too many requests",
    "resource exhausted",
    "resource_exhausted",
];

const BILLING_SIGNATURES: &[&str] = &["billed", "billing", "payment required"];

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Billing required: {0}")]
    Billing(String),

    #[error("AI service error while trying to {context} (status: {status:?}): {message}")]
    Api {
        status: Option<StatusCode>,
        context: String,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ForgeError {
    pub fn api(
        status: Option<StatusCode>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ForgeError::Api {
            status,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ForgeError::Validation(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        ForgeError::Render(message.into())
    }

    /// Maps a failed collaborator call onto the credential / quota / billing / generic taxonomy.
    ///
    /// Credential signatures win over quota, quota over billing.
    pub fn classify(context: &str, status: Option<StatusCode>, raw_message: &str) -> Self {
        let lower = raw_message.to_ascii_lowercase();
        let matches_any = |signatures: &[&str]| signatures.iter().any(|sig| lower.contains(sig));

        let credential_status = matches!(
            status,
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        );
        if credential_status || matches_any(CREDENTIAL_SIGNATURES) {
            return ForgeError::Credential(
                "The API key is invalid, incorrect or lacks the required permissions. Check the key and try again."
                    .to_string(),
            );
        }

        if status == Some(StatusCode::TOO_MANY_REQUESTS) || matches_any(QUOTA_SIGNATURES) {
            return ForgeError::Quota(
                "API usage limit exceeded. Check your quota and try again later.".to_string(),
            );
        }

        if status == Some(StatusCode::PAYMENT_REQUIRED) || matches_any(BILLING_SIGNATURES) {
            return ForgeError::Billing(
                "This API requires an account with billing enabled. Enable billing on your Google Cloud account."
                    .to_string(),
            );
        }

        let message = if raw_message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            raw_message.trim().to_string()
        };
        ForgeError::api(status, context, message)
    }

    pub fn is_credential(&self) -> bool {
        matches!(self, ForgeError::Credential(_))
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            ForgeError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            ForgeError::Network(e) => ErrorPayload::new(
                ErrorCategory::Network,
                e.to_string(),
                "Check connectivity/proxy/VPN and retry.",
            ),
            ForgeError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify the api.base_url setting (e.g., https://generativelanguage.googleapis.com).",
            ),
            ForgeError::Credential(msg) => ErrorPayload::new(
                ErrorCategory::Credential,
                msg.to_string(),
                "Stored keys were cleared; run `adforge key set <KEY>` (or set GEMINI_API_KEY) and retry.",
            ),
            ForgeError::Quota(msg) => ErrorPayload::new(
                ErrorCategory::Quota,
                msg.to_string(),
                "Wait a few minutes before retrying; the stored key was kept.",
            ),
            ForgeError::Billing(msg) => ErrorPayload::new(
                ErrorCategory::Billing,
                msg.to_string(),
                "Activate billing for the Google Cloud project that owns the key.",
            ),
            ForgeError::Api {
                context, message, ..
            } => ErrorPayload::new(
                ErrorCategory::Api,
                format!("Failed to {context}: {message}"),
                "Re-run with --verbose for request details; start the generation again.",
            ),
            ForgeError::Validation(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("project context") {
                    ErrorPayload::new(
                        ErrorCategory::Validation,
                        msg.to_string(),
                        "Pass --context TEXT (or --context-file PATH) describing the project or ad strategy.",
                    )
                } else if lower.contains("no active") || lower.contains("workspace") {
                    ErrorPayload::new(
                        ErrorCategory::Validation,
                        msg.to_string(),
                        "Run `adforge generate` or `adforge history select <ID>` first.",
                    )
                } else if lower.contains("api key") {
                    ErrorPayload::new(
                        ErrorCategory::Validation,
                        msg.to_string(),
                        "Copy the complete key from Google AI Studio (at least 20 characters).",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Validation,
                        msg.to_string(),
                        "Check the command arguments and retry.",
                    )
                }
            }
            ForgeError::Image(e) => ErrorPayload::new(
                ErrorCategory::Render,
                e.to_string(),
                "Verify the image payload/format (png, jpeg, gif, webp).",
            ),
            ForgeError::Render(msg) => ErrorPayload::new(
                ErrorCategory::Render,
                msg.to_string(),
                "Retry the export; check that system fonts are installed.",
            ),
            ForgeError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs; run with --verbose for details.",
            ),
            ForgeError::Storage(msg) => ErrorPayload::new(
                ErrorCategory::Storage,
                msg.to_string(),
                "Check that the data directory is writable (storage.data_dir).",
            ),
            ForgeError::Config(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Check flags/paths and the config file (--config PATH).",
            ),
            ForgeError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Validation,
    Credential,
    Quota,
    Billing,
    Network,
    Api,
    Render,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_credential_signature_in_message() {
        let err = ForgeError::classify(
            "generate the ad copy",
            Some(StatusCode::BAD_REQUEST),
            "API key not valid. Please pass a valid API key.",
        );
        assert!(err.is_credential());
    }

    #[test]
    fn classify_treats_forbidden_status_as_credential() {
        let err = ForgeError::classify("generate the image", Some(StatusCode::FORBIDDEN), "");
        assert!(err.is_credential());
    }

    #[test]
    fn classify_quota_does_not_clear_credentials() {
        let err = ForgeError::classify(
            "generate the image",
            Some(StatusCode::TOO_MANY_REQUESTS),
            "Resource has been exhausted (e.g. check quota).",
        );
        assert!(matches!(err, ForgeError::Quota(_)));
        assert!(!err.is_credential());
    }

    #[test]
    fn classify_detects_billing() {
        let err = ForgeError::classify(
            "generate the image",
            Some(StatusCode::BAD_REQUEST),
            "Imagen API is only accessible to billed users at this time.",
        );
        assert!(matches!(err, ForgeError::Billing(_)));
    }

    #[test]
    fn classify_keeps_underlying_message_for_generic_errors() {
        let err = ForgeError::classify(
            "plan the carousel",
            Some(StatusCode::INTERNAL_SERVER_ERROR),
            "backend exploded",
        );
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Api);
        assert!(
            payload.message.contains("backend exploded"),
            "expected underlying cause in message, got: {}",
            payload.message
        );
        assert!(payload.message.contains("plan the carousel"));
    }

    #[test]
    fn credential_payload_points_to_key_command() {
        let err = ForgeError::Credential("bad key".into());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("adforge key set"),
            "expected key remediation, got: {remediation}"
        );
    }

    #[test]
    fn validation_payload_mentions_context_flag() {
        let err = ForgeError::validation("Provide the project context or the ad strategy.");
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("--context"),
            "expected context remediation, got: {remediation}"
        );
    }

    #[test]
    fn validation_payload_for_missing_selection_suggests_generate() {
        let err = ForgeError::validation("No active carousel in the workspace");
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.contains("adforge generate"));
    }
}
