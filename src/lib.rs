//! CheckiO check bridge.
//!
//! This library drives the browser-hosted CheckiO grading pages on behalf
//! of a task-checking worker and converts the page's asynchronous,
//! event-driven verdict into a single, timeout-bounded result.
//!
//! # Architecture
//!
//! A check spans two execution contexts:
//!
//! - **Worker**: calls [`CheckOrchestrator::check`] (or
//!   [`check_blocking`](CheckOrchestrator::check_blocking)) and waits on a
//!   single-fire completion signal
//! - **Rendering context**: one task owning the [`RenderingSurface`]; it runs
//!   the navigation watcher and the result bridge, strictly serialized
//!
//! Key design principles:
//!
//! - The completion signal fires at most once per attempt
//! - Every attempt has its own signal, watcher and "visited" guard
//! - Load failures of sub-frames never fail a check
//! - The caller always gets a [`CheckResult`], never an error
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use checkio_bridge::{
//!     CancellationToken, CheckOptions, CheckOrchestrator, MemorySurface, PageEvent, PageSpec,
//!     RenderContext, Result, StaticToken, SubmittedTask,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let surface = MemorySurface::new()
//!         .route("checkioTestForm.html", PageSpec::test_form())
//!         .route("checkio.org", PageSpec::loads().emits(PageEvent::check_done(true)));
//!
//!     let orchestrator = CheckOrchestrator::new(
//!         RenderContext::spawn(surface),
//!         CheckOptions::new(),
//!         Arc::new(StaticToken::new("token")),
//!     )?;
//!
//!     let task = SubmittedTask::new("42", "print(1)");
//!     let result = orchestrator.check(&task, &CancellationToken::new()).await;
//!     println!("{result}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`check`] | Orchestrator, navigation watcher, result bridge |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Results, form payload, surface events |
//! | [`render`] | Rendering context event loop |
//! | [`surface`] | Rendering surface trait and in-memory surface |

// ============================================================================
// Modules
// ============================================================================

/// Check orchestration.
///
/// - [`CheckOrchestrator`] - caller-facing entry point
/// - [`NavigationWatcher`] - page flow state machine
/// - [`ResultBridge`] - verdict callback exposed to the page
pub mod check;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Check results, form payload and surface events.
pub mod protocol;

/// Rendering context.
///
/// Single-threaded event loop owning the surface.
pub mod render;

/// Rendering surfaces.
pub mod surface;

// ============================================================================
// Re-exports
// ============================================================================

// Check types
pub use check::{
    CancellationToken, CheckOptions, CheckOrchestrator, CheckioLanguage, ErrorReporter, LogReporter,
    NavigationWatcher, PageMarkers, ResultBridge, StaticToken, SubmittedTask, TaskSource,
    TokenProvider,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CheckId, ListenerId};

// Protocol types
pub use protocol::{
    CheckResult, CheckStatus, FormSubmissionPayload, LoadEvent, LoadState, PageEvent, SurfaceEvent,
};

// Rendering types
pub use render::{EventSink, ListenerControl, LoadListener, RenderContext, RenderHandle};

// Surface types
pub use surface::{MemorySurface, PageSpec, RenderingSurface, SurfaceProbe};
