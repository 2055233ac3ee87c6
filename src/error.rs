//! Error types for the check bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Internal operations return [`Result<T>`] which uses [`Error`]. Only the
//! orchestrator boundary turns errors into [`CheckResult`] values:
//!
//! ```ignore
//! use checkio_bridge::{Error, Result};
//!
//! fn populate(surface: &mut dyn RenderingSurface) -> Result<()> {
//!     surface.set_element_value("task-id", "42")?;
//!     surface.submit_form("test-form")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Network | [`Error::ConnectionFailed`] |
//! | Collaborators | [`Error::Auth`], [`Error::Task`] |
//! | Page contract | [`Error::ElementNotFound`], [`Error::Script`] |
//! | Execution | [`Error::RendererClosed`], [`Error::Cancelled`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`] |
//!
//! [`CheckResult`]: crate::protocol::CheckResult

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when [`CheckOptions`](crate::check::CheckOptions) fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Network Errors
    // ========================================================================
    /// The driven page failed to load.
    ///
    /// Raised when a top-level navigation of the check flow fails.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Access token could not be obtained.
    #[error("Authorization error: {message}")]
    Auth {
        /// Description of the failure.
        message: String,
    },

    /// Task id or submitted code could not be obtained.
    #[error("Task error: {message}")]
    Task {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Page Contract Errors
    // ========================================================================
    /// Element with the given id is not present on the current page.
    #[error("Element not found: #{element_id}")]
    ElementNotFound {
        /// The missing element id.
        element_id: String,
    },

    /// Script execution failed in the page.
    #[error("Script error: {message}")]
    Script {
        /// Error message from script execution.
        message: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// The rendering context is no longer running.
    ///
    /// Returned when a job cannot be scheduled, or when the completion
    /// signal is dropped without ever firing.
    #[error("Rendering context closed")]
    RendererClosed,

    /// The wait for a check result was cancelled.
    #[error("Checking was cancelled")]
    Cancelled,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection failed error.
    #[inline]
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[inline]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates a task error.
    #[inline]
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(element_id: impl Into<String>) -> Self {
        Self::ElementNotFound {
            element_id: element_id.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error should go through network-error handling.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Returns `true` if the wait was cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the driven page broke its fixed contract.
    #[inline]
    #[must_use]
    pub fn is_page_contract_error(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. } | Self::Script { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
