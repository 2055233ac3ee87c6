//! Rendering surfaces.
//!
//! A [`RenderingSurface`] is the embedded page the check flow drives. It is
//! owned by a rendering context and only ever touched from there.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RenderingSurface`] | Operations the check flow needs from a page host |
//! | [`MemorySurface`] | In-memory surface driven by a route table |
//! | [`SurfaceProbe`] | Read access to what a [`MemorySurface`] recorded |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::check::ResultBridge;
use crate::error::Result;
use crate::protocol::PageEvent;
use crate::render::EventSink;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory surface.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemorySurface, PageSpec, Submission, SurfaceProbe};

// ============================================================================
// RenderingSurface
// ============================================================================

/// A page host the check flow can drive.
///
/// No method may block: navigation results are reported later through the
/// [`EventSink`] handed to [`attach`](Self::attach).
pub trait RenderingSurface: Send + 'static {
    /// Receives the sink for load-state changes and page events.
    ///
    /// Called once, before the rendering context starts.
    fn attach(&mut self, sink: EventSink);

    /// Starts loading `url`.
    fn load(&mut self, url: &str) -> Result<()>;

    /// Returns the location of the current document.
    fn location(&self) -> String;

    /// Runs `script` in the page and returns its value.
    fn execute_script(&mut self, script: &str) -> Result<Value>;

    /// Sets the value of an input or textarea.
    fn set_element_value(&mut self, element_id: &str, value: &str) -> Result<()>;

    /// Sets the `action` of a form.
    fn set_form_action(&mut self, form_id: &str, action: &str) -> Result<()>;

    /// Submits a form, starting a new navigation.
    fn submit_form(&mut self, form_id: &str) -> Result<()>;

    /// Exposes `bridge` on the page's `window` under `name`.
    fn expose_bridge(&mut self, name: &str, bridge: ResultBridge) -> Result<()>;

    /// Dispatches a page event to the listeners installed in the page.
    fn dispatch_page_event(&mut self, event: &PageEvent) -> Result<()>;
}
