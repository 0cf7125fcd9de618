//! Custom error types for need.
//!
//! The core only fails on a broken rc file. Predicate evaluation,
//! classification and filter synthesis over well-formed settings are total;
//! host and hook errors come from the Taskwarrior side.

use thiserror::Error;

/// Main error type for need operations
#[derive(Error, Debug)]
pub enum NeedError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A rule or settings line could not be decomposed
    #[error("Config parse error on line {line}: {message}")]
    ConfigParse { line: usize, message: String },

    /// A settings value is out of range or unparseable
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Host Errors
    // =========================================================================
    /// The task-management host could not be queried or updated
    #[error("Host error: {message}")]
    Host { message: String },

    /// Hook input did not follow the hook protocol
    #[error("Hook '{name}' failed: {message}")]
    Hook { name: String, message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NeedError {
    /// Create a parse error for a 1-based line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid-config error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a host error
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Create a hook error
    pub fn hook(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Check if this error comes from a broken rc file
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse { .. } | Self::InvalidConfig { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigParse { .. } | Self::InvalidConfig { .. } => 7,
            Self::Host { .. } => 6,
            _ => 1,
        }
    }
}

/// Type alias for need results
pub type Result<T> = std::result::Result<T, NeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NeedError::parse(3, "tier 7 is out of range");
        assert!(err.to_string().contains("line 3"));
        assert!(err.to_string().contains("tier 7"));
    }

    #[test]
    fn test_invalid_display() {
        let err = NeedError::invalid("priority.span", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: priority.span - must be positive"
        );
    }

    #[test]
    fn test_is_config() {
        assert!(NeedError::parse(1, "x").is_config());
        assert!(NeedError::invalid("span", "x").is_config());
        assert!(!NeedError::host("task not found").is_config());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(NeedError::parse(1, "x").exit_code(), 7);
        assert_eq!(NeedError::invalid("span", "x").exit_code(), 7);
        assert_eq!(NeedError::host("x").exit_code(), 6);
        assert_eq!(NeedError::hook("on-add", "x").exit_code(), 1);
    }

    #[test]
    fn test_hook_error() {
        let err = NeedError::hook("on-modify", "expected two lines");
        if let NeedError::Hook { name, message } = err {
            assert_eq!(name, "on-modify");
            assert_eq!(message, "expected two lines");
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: NeedError = io_err.into();
        assert!(matches!(err, NeedError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
