//! Check result taxonomy.
//!
//! Every check attempt ends in exactly one [`CheckResult`]:
//!
//! | Status | Message | Cause |
//! |--------|---------|-------|
//! | `Solved` | All tests passed | page reported success |
//! | `Failed` | Tests failed | page reported failure |
//! | `ConnectionFailed` | Connection failed | a driven page failed to load |
//! | `Unchecked` | Checking took too much time | deadline expired |
//! | `Unchecked` | Checking was cancelled | wait was cancelled |
//! | `Unchecked` | Failed to launch checking | any other failure |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Message for a solved task.
pub const ALL_TESTS_PASSED: &str = "All tests passed";

/// Message for failing tests.
pub const TESTS_FAILED: &str = "Tests failed";

/// Message when the deadline expires.
pub const CHECK_TIMED_OUT: &str = "Checking took too much time";

/// Message when the wait is cancelled.
pub const CHECK_CANCELLED: &str = "Checking was cancelled";

/// Message for the generic failure path.
pub const FAILED_TO_CHECK: &str = "Failed to launch checking";

/// Message when a driven page fails to load.
pub const CONNECTION_FAILED: &str = "Connection failed";

/// Value the page reports when every test passed.
pub const TESTS_PASSED_CODE: i32 = 1;

// ============================================================================
// CheckStatus
// ============================================================================

/// Outcome class of a check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    /// No verdict was reached.
    Unchecked,
    /// All tests passed.
    Solved,
    /// At least one test failed.
    Failed,
    /// A driven page could not be loaded.
    ConnectionFailed,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unchecked => "unchecked",
            Self::Solved => "solved",
            Self::Failed => "failed",
            Self::ConnectionFailed => "connection failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// CheckResult
// ============================================================================

/// Result of one check attempt.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    status: CheckStatus,
    message: String,
}

impl CheckResult {
    /// Creates a result with an arbitrary status and message.
    #[inline]
    #[must_use]
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// All tests passed.
    #[inline]
    #[must_use]
    pub fn solved() -> Self {
        Self::new(CheckStatus::Solved, ALL_TESTS_PASSED)
    }

    /// Tests failed.
    #[inline]
    #[must_use]
    pub fn tests_failed() -> Self {
        Self::new(CheckStatus::Failed, TESTS_FAILED)
    }

    /// The deadline expired before the page reported.
    #[inline]
    #[must_use]
    pub fn timed_out() -> Self {
        Self::new(CheckStatus::Unchecked, CHECK_TIMED_OUT)
    }

    /// The wait was cancelled.
    #[inline]
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(CheckStatus::Unchecked, CHECK_CANCELLED)
    }

    /// Generic failure to run the check.
    #[inline]
    #[must_use]
    pub fn failed_to_check() -> Self {
        Self::new(CheckStatus::Unchecked, FAILED_TO_CHECK)
    }

    /// A driven page failed to load.
    #[inline]
    #[must_use]
    pub fn connection_failed() -> Self {
        Self::new(CheckStatus::ConnectionFailed, CONNECTION_FAILED)
    }

    /// Maps the integer the page hands to the result bridge.
    ///
    /// `1` means all tests passed; anything else means they failed.
    #[must_use]
    pub fn from_test_event(code: i32) -> Self {
        if code == TESTS_PASSED_CODE {
            Self::solved()
        } else {
            Self::tests_failed()
        }
    }
}

// ============================================================================
// CheckResult - Accessors
// ============================================================================

impl CheckResult {
    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Returns the message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for the connection-failed sentinel.
    #[inline]
    #[must_use]
    pub fn is_connection_failed(&self) -> bool {
        self.status == CheckStatus::ConnectionFailed
    }

    /// Returns `true` if the task was solved.
    #[inline]
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.status == CheckStatus::Solved
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

// ============================================================================
// Tests
// ============================================================================
