//! Load listener trait.

use crate::protocol::LoadEvent;
use crate::surface::RenderingSurface;

// ============================================================================
// ListenerControl
// ============================================================================

/// What the rendering context does with a listener after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerControl {
    /// Keep receiving events.
    Keep,
    /// Unregister the listener.
    Remove,
}

// ============================================================================
// LoadListener
// ============================================================================

/// Receives load-state changes on the rendering context.
///
/// Callbacks run on the rendering context only, one at a time, and must
/// not block.
pub trait LoadListener: Send {
    /// Called for every load-state change of the surface.
    fn on_load_state(
        &mut self,
        event: &LoadEvent,
        surface: &mut dyn RenderingSurface,
    ) -> ListenerControl;
}
