//! External collaborators of a check.
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`TokenProvider`] | OAuth access token (may hit the network) |
//! | [`TaskSource`] | task id and submitted code |
//! | [`ErrorReporter`] | generic "failed to check" error handling |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::error::{Error, Result};

// ============================================================================
// TokenProvider
// ============================================================================

/// Supplies the access token for the CheckiO API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid access token, refreshing it if needed.
    ///
    /// # Errors
    ///
    /// Network failures and rejected credentials, typically [`Error::Auth`].
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps `token`.
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// TaskSource
// ============================================================================

/// The task being checked.
pub trait TaskSource: Send + Sync {
    /// Returns the CheckiO task id.
    fn task_id(&self) -> String;

    /// Returns the code to submit.
    ///
    /// # Errors
    ///
    /// [`Error::Task`] if the solution cannot be read.
    fn code(&self) -> Result<String>;
}

/// A task whose code is already in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTask {
    id: String,
    code: String,
}

impl SubmittedTask {
    /// Creates a task.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
        }
    }
}

impl TaskSource for SubmittedTask {
    fn task_id(&self) -> String {
        self.id.clone()
    }

    fn code(&self) -> Result<String> {
        Ok(self.code.clone())
    }
}

// ============================================================================
// ErrorReporter
// ============================================================================

/// Handles errors that end a check with a failed-to-check result.
pub trait ErrorReporter: Send + Sync {
    /// Reports `error`; `context` says what was being attempted.
    fn report(&self, context: &str, error: &Error);
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, error: &Error) {
        if error.is_connection_error() {
            warn!(error = %error, "{context}: connection problem");
        } else {
            error!(error = %error, "{context}");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
