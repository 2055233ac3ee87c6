//! Surface event types.
//!
//! Events are notifications a rendering surface reports back into the
//! rendering context.
//!
//! # Event Types
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`LoadEvent`] | load-state change of the surface (`loading`, `succeeded`, `failed`) |
//! | [`PageEvent`] | custom DOM event dispatched by the page (`checkio:checkDone`) |
//!
//! Both are JSON-shaped so a surface backed by a real browser can forward
//! them as-is:
//!
//! ```json
//! { "previous": "loading", "state": "succeeded", "location": "https://…", "mainFrame": true }
//! { "name": "checkio:checkDone", "detail": { "success": true } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ============================================================================
// Constants
// ============================================================================

/// Custom event the result page dispatches when checking is done.
pub const CHECK_DONE_EVENT: &str = "checkio:checkDone";

// ============================================================================
// LoadState
// ============================================================================

/// Load state of a rendering surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A navigation is in progress.
    Loading,
    /// The navigation finished successfully.
    Succeeded,
    /// The navigation failed.
    Failed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// LoadEvent
// ============================================================================

/// A load-state change of the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEvent {
    /// State before the change.
    #[serde(default)]
    pub previous: LoadState,

    /// State after the change.
    pub state: LoadState,

    /// Location of the document the change applies to.
    pub location: String,

    /// `false` for sub-frames and sub-resources.
    #[serde(default = "main_frame_default")]
    pub main_frame: bool,
}

fn main_frame_default() -> bool {
    true
}

impl LoadEvent {
    /// Creates a main-frame event.
    #[inline]
    #[must_use]
    pub fn new(previous: LoadState, state: LoadState, location: impl Into<String>) -> Self {
        Self {
            previous,
            state,
            location: location.into(),
            main_frame: true,
        }
    }

    /// A navigation to `location` started.
    #[inline]
    #[must_use]
    pub fn loading(location: impl Into<String>) -> Self {
        Self::new(LoadState::Idle, LoadState::Loading, location)
    }

    /// A navigation to `location` succeeded.
    #[inline]
    #[must_use]
    pub fn succeeded(location: impl Into<String>) -> Self {
        Self::new(LoadState::Loading, LoadState::Succeeded, location)
    }

    /// A navigation to `location` failed.
    #[inline]
    #[must_use]
    pub fn failed(location: impl Into<String>) -> Self {
        Self::new(LoadState::Loading, LoadState::Failed, location)
    }

    /// Marks the event as belonging to a sub-frame or sub-resource.
    #[inline]
    #[must_use]
    pub fn in_subframe(mut self) -> Self {
        self.main_frame = false;
        self
    }

    /// Returns `true` if a top-level navigation failed.
    #[inline]
    #[must_use]
    pub fn is_main_frame_failure(&self) -> bool {
        self.main_frame && self.state == LoadState::Failed
    }

    /// Returns `true` if this is a successful load.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == LoadState::Succeeded
    }
}

// ============================================================================
// PageEvent
// ============================================================================

/// A custom DOM event dispatched by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEvent {
    /// Event name (e.g. `checkio:checkDone`).
    pub name: String,

    /// Event `detail` payload.
    #[serde(default)]
    pub detail: Value,
}

impl PageEvent {
    /// Creates a new page event.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
        }
    }

    /// Creates the `checkio:checkDone` event.
    #[inline]
    #[must_use]
    pub fn check_done(success: bool) -> Self {
        Self::new(CHECK_DONE_EVENT, json!({ "success": success }))
    }

    /// Returns `detail.success`, treating anything but `true` as `false`.
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.detail
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }
}

// ============================================================================
// SurfaceEvent
// ============================================================================

/// Anything a surface reports into the rendering context.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Load-state change.
    Load(LoadEvent),
    /// Custom page event.
    Page(PageEvent),
}

impl From<LoadEvent> for SurfaceEvent {
    fn from(event: LoadEvent) -> Self {
        Self::Load(event)
    }
}

impl From<PageEvent> for SurfaceEvent {
    fn from(event: PageEvent) -> Self {
        Self::Page(event)
    }
}

// ============================================================================
// Tests
// ============================================================================
