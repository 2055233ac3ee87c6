//! Form submission payload and the fixed test-form contract.
//!
//! The bundled test form exposes these element ids, which must match the
//! page byte-for-byte:
//!
//! | Id | Element | Value |
//! |----|---------|-------|
//! | `access-token` | input | OAuth access token |
//! | `task-id` | input | CheckiO task id |
//! | `interpreter` | input | interpreter name (`python-3`, `js-node`) |
//! | `code` | textarea | submitted source |
//! | `test-form` | form | action set to the target URL, then submitted |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Access token input id.
pub const ACCESS_TOKEN_FIELD: &str = "access-token";

/// Task id input id.
pub const TASK_ID_FIELD: &str = "task-id";

/// Interpreter input id.
pub const INTERPRETER_FIELD: &str = "interpreter";

/// Code textarea id.
pub const CODE_FIELD: &str = "code";

/// Test form id.
pub const TEST_FORM_ID: &str = "test-form";

// ============================================================================
// FormSubmissionPayload
// ============================================================================

/// Values injected into the test form for one check attempt.
///
/// Write-once: built from the collaborators, then only read.
#[derive(Clone, PartialEq, Eq)]
pub struct FormSubmissionPayload {
    access_token: String,
    task_id: String,
    interpreter_name: String,
    code: String,
    target_url: String,
}

impl FormSubmissionPayload {
    /// Creates a new payload.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        task_id: impl Into<String>,
        interpreter_name: impl Into<String>,
        code: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            task_id: task_id.into(),
            interpreter_name: interpreter_name.into(),
            code: code.into(),
            target_url: target_url.into(),
        }
    }

    /// Returns `(element id, value)` for each of the four form fields,
    /// in the order they are populated.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            (ACCESS_TOKEN_FIELD, &self.access_token),
            (TASK_ID_FIELD, &self.task_id),
            (INTERPRETER_FIELD, &self.interpreter_name),
            (CODE_FIELD, &self.code),
        ]
    }
}

// ============================================================================
// FormSubmissionPayload - Accessors
// ============================================================================

impl FormSubmissionPayload {
    /// Returns the access token.
    #[inline]
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the task id.
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the interpreter name.
    #[inline]
    #[must_use]
    pub fn interpreter_name(&self) -> &str {
        &self.interpreter_name
    }

    /// Returns the submitted code.
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the URL the form is submitted to.
    #[inline]
    #[must_use]
    pub fn target_url(&self) -> &str {
        &self.target_url
    }
}

// Keeps the token out of logs.
impl fmt::Debug for FormSubmissionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSubmissionPayload")
            .field("task_id", &self.task_id)
            .field("interpreter_name", &self.interpreter_name)
            .field("code_len", &self.code.len())
            .field("target_url", &self.target_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
