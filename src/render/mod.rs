//! Rendering context.
//!
//! The rendering context is the single-threaded, cooperative side of a
//! check. It owns the surface and runs every navigation callback, strictly
//! one after another, and never blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   run_later(job)    ┌──────────────────────────┐
//! │  CheckOrchestrator │────────────────────►│  RenderContext task      │
//! │  (worker, blocks)  │                     │  ├─ RenderingSurface     │
//! └────────────────────┘                     │  └─ LoadListener list    │
//!           ▲                                └──────────────────────────┘
//!           │ CompletionSignal (fires once)         ▲        │
//!           └───────────────────────────────────────┼────────┘
//!                                       EventSink   │ load / page events
//!                                                   │
//!                                        ┌──────────┴────────┐
//!                                        │  surface backend  │
//!                                        └───────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `context` | Event loop, handle and sink |
//! | `listener` | Load listener trait |

// ============================================================================
// Submodules
// ============================================================================

/// Event loop, handle and sink.
pub mod context;

/// Load listener trait.
pub mod listener;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::{EventSink, RenderContext, RenderHandle, RenderJob, RenderScope};
pub use listener::{ListenerControl, LoadListener};
