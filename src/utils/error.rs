use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Credential refresh failed: {message}")]
    CredentialError { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    DecodeError(#[source] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("No active session")]
    NoSession,

    #[error("Reservation not found: {id}")]
    NotFound { id: String },

    #[error("Reservation refresh was interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, DeskError>;

/// How a failed reservation fetch is classified. The poller treats all
/// four the same way; the distinction only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Credential,
    Transport,
    Status,
    MalformedBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeskError {
    pub fn config(message: impl Into<String>) -> Self {
        DeskError::ConfigError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DeskError::ValidationError {
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        DeskError::CredentialError {
            message: message.into(),
        }
    }

    /// Fetch failure class, or `None` for errors that never come out of a fetch.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            DeskError::CredentialError { .. } | DeskError::NoSession => {
                Some(FailureKind::Credential)
            }
            DeskError::ApiError(e) if e.is_decode() => Some(FailureKind::MalformedBody),
            DeskError::ApiError(_) => Some(FailureKind::Transport),
            DeskError::StatusError { .. } => Some(FailureKind::Status),
            DeskError::DecodeError(_) => Some(FailureKind::MalformedBody),
            _ => None,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeskError::ValidationError { .. } | DeskError::NotFound { .. } => ErrorSeverity::Low,
            DeskError::ApiError(_)
            | DeskError::StatusError { .. }
            | DeskError::DecodeError(_)
            | DeskError::CredentialError { .. }
            | DeskError::Interrupted => ErrorSeverity::Medium,
            DeskError::ConfigError { .. }
            | DeskError::MissingConfigError { .. }
            | DeskError::InvalidConfigValueError { .. }
            | DeskError::NoSession
            | DeskError::CsvError(_) => ErrorSeverity::High,
            DeskError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DeskError::CredentialError { .. } | DeskError::NoSession => {
                "Could not obtain a valid sign-in credential".to_string()
            }
            DeskError::ApiError(_) => "The reservations service could not be reached".to_string(),
            DeskError::StatusError { status, message } => {
                format!("The reservations service rejected the request ({status}): {message}")
            }
            DeskError::DecodeError(_) => {
                "The reservations service sent a response that could not be read".to_string()
            }
            DeskError::NotFound { id } => format!("No reservation with id {id}"),
            DeskError::ValidationError { message } => message.clone(),
            DeskError::ConfigError { .. }
            | DeskError::MissingConfigError { .. }
            | DeskError::InvalidConfigValueError { .. } => format!("Configuration problem: {self}"),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DeskError::CredentialError { .. } | DeskError::NoSession => {
                "Check the [auth] section or sign in again"
            }
            DeskError::ApiError(_) => "Check that api.base_url is reachable",
            DeskError::StatusError { status, .. } if *status == 401 || *status == 403 => {
                "The credential was rejected; check the session role and token"
            }
            DeskError::StatusError { .. } | DeskError::DecodeError(_) | DeskError::Interrupted => {
                "Retry later; the service may be degraded"
            }
            DeskError::ConfigError { .. }
            | DeskError::MissingConfigError { .. }
            | DeskError::InvalidConfigValueError { .. } => "Fix the configuration file and retry",
            DeskError::ValidationError { .. } => "Correct the input and retry",
            DeskError::NotFound { .. } => "List reservations to find a valid id",
            DeskError::IoError(_) | DeskError::CsvError(_) => {
                "Check file permissions and available disk space"
            }
        }
    }
}
