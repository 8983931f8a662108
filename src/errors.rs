//! Unified error handling.
//!
//! A `thiserror`-based model with:
//!   * Typed variants for the failure domains of the boundary layers
//!     (loading the dataset, restoring share links, rendering)
//!   * A categorization layer (`ErrorCategory`) for structured reporting
//!   * Helper constructors
//!   * `From<ConfigError>` so config validation propagates with `?`
//!
//! The search core never produces these: parsing drops bad rows and queries
//! degrade to an empty result set. Errors only surface where I/O happens.
//!
//! Usage:
//!   use cspbypass::errors::{Result, CspBypassError, ErrorCategory};
//!
//!   fn do_something() -> Result<()> {
//!       Err(CspBypassError::configuration("owner must not be empty"))
//!   }
//!
//! Categories are intentionally coarse:
//!   - Input: User / configuration issues
//!   - Network: Transient or remote-service problems
//!   - Parse: Data-format decoding issues
//!   - Internal: Local I/O, rendering, unexpected states
//!
//! Variants that wrap external errors retain sources to preserve backtraces
//! (when RUST_BACKTRACE=1).

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// High-level classification for structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Parse,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Network => "network",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary application error type.
#[derive(Error, Debug)]
pub enum CspBypassError {
    // ------------------------ Input / Validation ----------------------------
    #[error("No query given (pass a QUERY argument, --from-link or --interactive)")]
    MissingQuery,

    #[error("Invalid share link '{link}': {reason}")]
    InvalidLink { link: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ---------------------------- Parsing -----------------------------------
    #[error("Resource {resource} is not valid UTF-8 text: {reason}")]
    InvalidEncoding { resource: String, reason: String },

    // ----------------------------- Network ----------------------------------
    #[error("Network error during {operation} for '{target}': {source}")]
    Network {
        operation: String,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timed out after {seconds}s: {target}")]
    Timeout { target: String, seconds: u64 },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Failed to render {format} output: {reason}")]
    Render { format: String, reason: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CspBypassError {
    /// Categorize the error for structured output.
    pub fn category(&self) -> ErrorCategory {
        use CspBypassError::*;
        match self {
            MissingQuery | InvalidLink { .. } | Configuration { .. } => ErrorCategory::Input,

            InvalidEncoding { .. } => ErrorCategory::Parse,

            Network { .. } | HttpStatus { .. } | Timeout { .. } => ErrorCategory::Network,

            Io { .. } | Render { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Process exit code for errors that abort a CLI run.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input => 1,
            _ => 2,
        }
    }

    // ---------------------------- Constructors -----------------------------

    pub fn invalid_link(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLink {
            link: link.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_encoding(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn network(
        operation: impl Into<String>,
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            operation: operation.into(),
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub fn timeout(target: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            target: target.into(),
            seconds,
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn render(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            format: format.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, CspBypassError>;

impl From<ConfigError> for CspBypassError {
    fn from(e: ConfigError) -> Self {
        CspBypassError::Configuration {
            message: e.to_string(),
        }
    }
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| CspBypassError::io(path.into(), operation.into(), e))
    }
}
