use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Login failed for {username}: {message}")]
    AuthenticationFailed { username: String, message: String },

    #[error("Verification for {username} was not completed: {reason}")]
    ChallengeAborted { username: String, reason: String },

    #[error("Rate limit reached: {message}")]
    RateLimited { message: String },

    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    #[error("Remote API returned {status}: {message}")]
    RemoteError { status: u16, message: String },

    #[error("Could not read video dimensions from {path:?}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("Invalid link {url}: {reason}")]
    InvalidLink { url: String, reason: String },

    #[error("Workspace {path:?} could not be prepared: {message}")]
    WorkspaceError { path: PathBuf, message: String },

    #[error("{message}")]
    InputAbsent { message: String },

    #[error("No reels were downloaded ({attempted} links attempted)")]
    NoDownloads { attempted: usize },

    #[error("Interrupted by user")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Network,
    RateLimit,
    Input,
    Media,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::IoError(_) | RelayError::WorkspaceError { .. } => ErrorCategory::Storage,
            RelayError::ApiError(_)
            | RelayError::SerializationError(_)
            | RelayError::RemoteError { .. } => ErrorCategory::Network,
            RelayError::ConfigValidationError { .. }
            | RelayError::MissingConfigError { .. }
            | RelayError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RelayError::AuthenticationFailed { .. }
            | RelayError::ChallengeAborted { .. }
            | RelayError::SessionExpired { .. } => ErrorCategory::Authentication,
            RelayError::RateLimited { .. } => ErrorCategory::RateLimit,
            RelayError::InvalidLink { .. }
            | RelayError::InputAbsent { .. }
            | RelayError::NoDownloads { .. }
            | RelayError::Interrupted => ErrorCategory::Input,
            RelayError::ProbeFailed { .. } => ErrorCategory::Media,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::RateLimit | ErrorCategory::Media => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::RateLimited { .. } => "Wait a few minutes before trying again",
            RelayError::SessionExpired { .. } => "Log in again and restart the run",
            RelayError::AuthenticationFailed { .. } => "Check the account credentials",
            RelayError::ChallengeAborted { .. } => {
                "Request a new verification code and run again"
            }
            RelayError::MissingConfigError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::ConfigValidationError { .. } => {
                "Check the configuration file and environment variables"
            }
            RelayError::InputAbsent { .. } | RelayError::InvalidLink { .. } => {
                "Make sure the links file exists and contains one reel URL per line"
            }
            RelayError::NoDownloads { .. } => "Check the links and the download account",
            RelayError::Interrupted => "Run again when ready",
            RelayError::ProbeFailed { .. } => "Make sure ffprobe is installed and on PATH",
            RelayError::WorkspaceError { .. } | RelayError::IoError(_) => {
                "Check file permissions and free disk space"
            }
            RelayError::ApiError(_)
            | RelayError::SerializationError(_)
            | RelayError::RemoteError { .. } => "Check that the API bridge is reachable",
        }
    }

    /// The user asked to stop; not a failure of the run.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, RelayError::Interrupted)
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Authentication => format!("Authentication problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::RateLimit => format!("Rate limited: {}", self),
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Media => format!("Media problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = RelayError::RateLimited {
            message: "wait a few minutes".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::RateLimit);
        assert_eq!(err.severity(), ErrorSeverity::Low);

        let err = RelayError::MissingConfigError {
            field: "upload.caption".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
        assert!(!err.is_interrupt());
        assert!(RelayError::Interrupted.is_interrupt());
    }
}
