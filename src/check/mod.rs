//! Check bridge.
//!
//! Drives the CheckiO grading pages on behalf of a caller and turns the
//! page's asynchronous verdict into a single, timeout-bounded
//! [`CheckResult`](crate::protocol::CheckResult).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use checkio_bridge::check::{
//!     CancellationToken, CheckOptions, CheckOrchestrator, StaticToken, SubmittedTask,
//! };
//! use checkio_bridge::render::RenderContext;
//! use checkio_bridge::surface::MemorySurface;
//!
//! # async fn example() -> checkio_bridge::Result<()> {
//! let renderer = RenderContext::spawn(MemorySurface::new());
//! let orchestrator = CheckOrchestrator::new(
//!     renderer,
//!     CheckOptions::new(),
//!     Arc::new(StaticToken::new("token")),
//! )?;
//!
//! let task = SubmittedTask::new("42", "print(1)");
//! let result = orchestrator.check(&task, &CancellationToken::new()).await;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `orchestrator` | [`CheckOrchestrator`], the caller-facing entry point |
//! | `watcher` | [`NavigationWatcher`] state machine |
//! | `bridge` | [`ResultBridge`] exposed to the result page |
//! | `signal` | Single-fire completion signal |
//! | `collaborators` | Token, task and error-reporting traits |
//! | `options` | [`CheckOptions`] and page markers |
//! | `assets` | Bundled test form page |

// ============================================================================
// Submodules
// ============================================================================

/// Bundled test form page.
pub mod assets;

/// Result bridge and page listener script.
pub mod bridge;

/// External collaborators.
pub mod collaborators;

/// Check configuration.
pub mod options;

/// Check orchestrator.
pub mod orchestrator;

/// Single-fire completion signal.
pub mod signal;

/// Navigation watcher.
pub mod watcher;

// ============================================================================
// Re-exports
// ============================================================================

pub use assets::FormPage;
pub use bridge::{BRIDGE_MEMBER, BRIDGE_METHOD, ResultBridge, listener_script};
pub use collaborators::{
    ErrorReporter, LogReporter, StaticToken, SubmittedTask, TaskSource, TokenProvider,
};
pub use options::{CheckOptions, CheckioLanguage, DEFAULT_TIMEOUT, PageMarkers};
pub use orchestrator::{CHECK_FAILED_CONTEXT, CheckOrchestrator};
pub use signal::{CompletionTrigger, CompletionWaiter, WaitOutcome, completion_signal};
pub use watcher::{NavigationState, NavigationWatcher, Phase};

/// Token the caller cancels to stop waiting for a check.
pub use tokio_util::sync::CancellationToken;
