use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid address range '{input}': {reason}")]
    ParseError { input: String, reason: String },

    #[error("Failed to resolve host '{host}': {reason}")]
    ResolutionError { host: String, reason: String },

    #[error("HTTP transport failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Failed to write artifact {path}: {source}")]
    ArtifactWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Scan cancelled after {scanned} probes ({matched} matches)")]
    CancelledError { scanned: u64, matched: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Storage,
    Configuration,
    Cancellation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ParseError { .. } => ErrorCategory::Input,
            ScanError::ResolutionError { .. } | ScanError::TransportError(_) => {
                ErrorCategory::Network
            }
            ScanError::ArtifactWriteError { .. } | ScanError::IoError(_) => ErrorCategory::Storage,
            ScanError::ConfigValidationError { .. } | ScanError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ScanError::CancelledError { .. } => ErrorCategory::Cancellation,
        }
    }

    /// Drives the binary's exit code. Per-target network failures never reach
    /// the top level, so they rank low.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancellation => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::ParseError { input, .. } => {
                format!("Could not understand the address range '{}'", input)
            }
            ScanError::ResolutionError { host, .. } => {
                format!("Could not resolve '{}' to an IPv4 address", host)
            }
            ScanError::TransportError(_) => "A network request failed".to_string(),
            ScanError::ArtifactWriteError { path, .. } => {
                format!("Could not save artifact to {}", path.display())
            }
            ScanError::IoError(e) => format!("File system error: {}", e),
            ScanError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            ScanError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid '{}': {}", field, reason)
            }
            ScanError::CancelledError { scanned, matched } => format!(
                "Scan interrupted after {} probes, {} Jupyter Lab instances found",
                scanned, matched
            ),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScanError::ParseError { .. } => {
                "Use the form start_ip-end_ip with start <= end, e.g. 10.0.0.1-10.0.0.254"
            }
            ScanError::ResolutionError { .. } => "Check the hostname and your DNS settings",
            ScanError::TransportError(_) => "Check network connectivity and timeouts",
            ScanError::ArtifactWriteError { .. } | ScanError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            ScanError::ConfigValidationError { .. } | ScanError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            ScanError::CancelledError { .. } => "Re-run the scan to cover the remaining targets",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
