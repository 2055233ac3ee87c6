//! Result bridge exposed into the result page.
//!
//! The result page cannot call into the host directly. The watcher exposes a
//! [`ResultBridge`] under [`BRIDGE_MEMBER`] and installs a page listener for
//! `checkio:checkDone` that forwards `detail.success` as `1` / `0`:
//!
//! ```js
//! window.addEventListener("checkio:checkDone", function (e) {
//!     window.checkioHandler.handleTestEvent(e.detail.success ? 1 : 0);
//! }, false);
//! ```
//!
//! The bridge only holds the firing side of the completion signal, so a
//! second invocation in the same attempt does nothing.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::identifiers::CheckId;
use crate::protocol::{CHECK_DONE_EVENT, CheckResult, PageEvent};

use super::signal::CompletionTrigger;

// ============================================================================
// Constants
// ============================================================================

/// Name the bridge is exposed under on `window`.
pub const BRIDGE_MEMBER: &str = "checkioHandler";

/// Method the page listener calls on the bridge.
pub const BRIDGE_METHOD: &str = "handleTestEvent";

// ============================================================================
// ResultBridge
// ============================================================================

/// Callback object the page reports its verdict through.
#[derive(Debug, Clone)]
pub struct ResultBridge {
    check_id: CheckId,
    trigger: CompletionTrigger,
}

impl ResultBridge {
    /// Creates a bridge that fires `trigger`.
    #[inline]
    #[must_use]
    pub fn new(check_id: CheckId, trigger: CompletionTrigger) -> Self {
        Self { check_id, trigger }
    }

    /// Handles the integer the page listener forwards.
    ///
    /// `1` means all tests passed, any other value means they failed.
    /// Returns `true` if this call completed the attempt.
    pub fn handle_test_event(&self, code: i32) -> bool {
        let result = CheckResult::from_test_event(code);
        let fired = self.trigger.fire(result);
        debug!(check_id = %self.check_id, code, fired, "Test event received");
        fired
    }

    /// Runs the installed page listener for `event`.
    ///
    /// Events other than `checkio:checkDone` are ignored.
    pub fn handle_page_event(&self, event: &PageEvent) -> bool {
        if event.name != CHECK_DONE_EVENT {
            return false;
        }
        self.handle_test_event(i32::from(event.success()))
    }

    /// Returns the attempt this bridge belongs to.
    #[inline]
    #[must_use]
    pub fn check_id(&self) -> CheckId {
        self.check_id
    }
}

// ============================================================================
// Listener Script
// ============================================================================

/// Builds the page script that wires `checkio:checkDone` to the bridge.
#[must_use]
pub fn listener_script() -> String {
    format!(
        "function handleCheckDone(e) {{\n\
         \twindow.{BRIDGE_MEMBER}.{BRIDGE_METHOD}(e.detail.success ? 1 : 0);\n\
         }}\n\
         window.addEventListener({event}, handleCheckDone, false);",
        event = json_string(CHECK_DONE_EVENT),
    )
}

/// Escapes a string for safe use in JavaScript.
pub(crate) fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

// ============================================================================
// Tests
// ============================================================================
