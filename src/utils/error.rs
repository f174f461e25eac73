use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed response envelope at '{element}': {message}")]
    MalformedEnvelope { element: String, message: String },

    #[error("Baseline schema validation failed: {message}")]
    SchemaValidation { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Output error: {message}")]
    OutputError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Envelope,
    Schema,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn malformed(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            element: element.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatus { .. } => ErrorCategory::Transport,
            Self::MalformedEnvelope { .. } => ErrorCategory::Envelope,
            Self::SchemaValidation { .. } => ErrorCategory::Schema,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ZipError(_)
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::OutputError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // Transient on the upstream side; a rerun may succeed.
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Envelope | ErrorCategory::Schema => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpStatus { status: 401, .. } | Self::HttpStatus { status: 403, .. } => {
                "Check QUALYS_USERNAME and QUALYS_PASSWORD"
            }
            Self::ApiError(_) | Self::HttpStatus { .. } => {
                "Check the base URL and network connectivity, then retry"
            }
            Self::MalformedEnvelope { .. } => {
                "The endpoint did not return a connector listing page; verify the endpoint path"
            }
            Self::SchemaValidation { .. } => {
                "The mapping table no longer matches the baseline schema; run with --drift"
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix config.toml / config.yaml or the QUALYS_* environment variables"
            }
            _ => "Check that the output path is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Transport => format!("Could not reach the connector API: {}", self),
            ErrorCategory::Envelope => format!("Unexpected API response: {}", self),
            ErrorCategory::Schema => format!("Baseline mapping is out of date: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Output => format!("Failed to write output: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_severity() {
        let err = EtlError::HttpStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = EtlError::malformed("content", "missing");
        assert_eq!(err.category(), ErrorCategory::Envelope);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("'content'"));
    }

    #[test]
    fn test_auth_failure_suggests_credentials() {
        let err = EtlError::HttpStatus {
            status: 401,
            url: "https://example.com".to_string(),
        };
        assert!(err.recovery_suggestion().contains("QUALYS_USERNAME"));
        assert!(err.user_friendly_message().starts_with("Could not reach"));
    }
}
