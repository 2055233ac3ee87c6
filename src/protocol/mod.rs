//! Shared vocabulary of the check flow.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Load-state and page events reported by a surface |
//! | `payload` | Form submission payload and the test-form element ids |
//! | `result` | Check result taxonomy |

// ============================================================================
// Submodules
// ============================================================================

/// Surface event types.
pub mod event;

/// Form submission payload.
pub mod payload;

/// Check result taxonomy.
pub mod result;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{CHECK_DONE_EVENT, LoadEvent, LoadState, PageEvent, SurfaceEvent};
pub use payload::FormSubmissionPayload;
pub use result::{CheckResult, CheckStatus};
