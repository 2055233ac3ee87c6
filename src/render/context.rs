//! Rendering context event loop.
//!
//! One tokio task owns the [`RenderingSurface`] and every registered
//! [`LoadListener`]. It handles:
//!
//! - Jobs scheduled with [`RenderHandle::run_later`]
//! - Load-state changes reported through the [`EventSink`]
//! - Page events, dispatched back into the surface's page listeners
//!
//! Everything runs on that one task, so jobs and callbacks never overlap.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ListenerId;
use crate::protocol::{LoadEvent, SurfaceEvent};
use crate::surface::RenderingSurface;

use super::listener::{ListenerControl, LoadListener};

// ============================================================================
// Types
// ============================================================================

/// A job run on the rendering context.
pub type RenderJob = Box<dyn FnOnce(&mut RenderScope<'_>) + Send>;

/// A listener together with its id.
struct RegisteredListener {
    id: ListenerId,
    listener: Box<dyn LoadListener>,
}

// ============================================================================
// RenderCommand
// ============================================================================

/// Internal commands for the event loop.
enum RenderCommand {
    /// Run a job on the rendering context.
    RunLater(RenderJob),
    /// Stop the event loop.
    Shutdown,
}

// ============================================================================
// EventSink
// ============================================================================

/// Handle a surface uses to report events into its rendering context.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl EventSink {
    /// Creates a detached sink and the receiver its events land in.
    ///
    /// Useful for driving a surface without a rendering context.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues an event. Returns `false` if the context is gone.
    pub fn emit(&self, event: impl Into<SurfaceEvent>) -> bool {
        self.tx.send(event.into()).is_ok()
    }
}

// ============================================================================
// RenderScope
// ============================================================================

/// Access to the rendering context from inside a job.
pub struct RenderScope<'a> {
    surface: &'a mut dyn RenderingSurface,
    listeners: &'a mut Vec<RegisteredListener>,
}

impl RenderScope<'_> {
    /// Returns the surface.
    #[inline]
    pub fn surface(&mut self) -> &mut dyn RenderingSurface {
        &mut *self.surface
    }

    /// Registers a load listener.
    pub fn add_listener(&mut self, listener: Box<dyn LoadListener>) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.push(RegisteredListener { id, listener });
        trace!(listener_id = %id, "Listener added");
        id
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

// ============================================================================
// RenderHandle
// ============================================================================

/// Handle to a running rendering context.
///
/// Cloneable and `Send + Sync`. The event loop stops once
/// [`shutdown`](Self::shutdown) is called or every handle is dropped.
#[derive(Clone)]
pub struct RenderHandle {
    command_tx: mpsc::UnboundedSender<RenderCommand>,
    event_tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl RenderHandle {
    /// Schedules `job` on the rendering context and returns immediately.
    ///
    /// # Errors
    ///
    /// [`Error::RendererClosed`] if the event loop has stopped.
    pub fn run_later<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce(&mut RenderScope<'_>) + Send + 'static,
    {
        self.command_tx
            .send(RenderCommand::RunLater(Box::new(job)))
            .map_err(|_| Error::RendererClosed)
    }

    /// Returns a sink that feeds events into this context.
    #[inline]
    #[must_use]
    pub fn event_sink(&self) -> EventSink {
        EventSink {
            tx: self.event_tx.clone(),
        }
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Stops the event loop. Pending jobs queued after this are dropped.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(RenderCommand::Shutdown);
    }
}

// ============================================================================
// RenderContext
// ============================================================================

/// Spawns rendering contexts.
pub struct RenderContext;

impl RenderContext {
    /// Spawns the event loop for `surface` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<S: RenderingSurface>(surface: S) -> RenderHandle {
        Self::spawn_on(surface, &Handle::current())
    }

    /// Spawns the event loop for `surface` on `runtime`.
    pub fn spawn_on<S: RenderingSurface>(mut surface: S, runtime: &Handle) -> RenderHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let handle = RenderHandle {
            command_tx,
            event_tx,
        };
        surface.attach(handle.event_sink());

        runtime.spawn(Self::run_event_loop(Box::new(surface), command_rx, event_rx));
        debug!("Rendering context started");

        handle
    }

    /// Event loop serializing jobs and surface events.
    async fn run_event_loop(
        mut surface: Box<dyn RenderingSurface>,
        mut command_rx: mpsc::UnboundedReceiver<RenderCommand>,
        mut event_rx: mpsc::UnboundedReceiver<SurfaceEvent>,
    ) {
        let mut listeners: Vec<RegisteredListener> = Vec::new();

        loop {
            tokio::select! {
                // Jobs from callers
                command = command_rx.recv() => {
                    match command {
                        Some(RenderCommand::RunLater(job)) => {
                            let mut scope = RenderScope {
                                surface: surface.as_mut(),
                                listeners: &mut listeners,
                            };
                            job(&mut scope);
                        }

                        Some(RenderCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }

                // Events from the surface
                event = event_rx.recv() => {
                    match event {
                        Some(SurfaceEvent::Load(event)) => {
                            Self::dispatch_load(&event, surface.as_mut(), &mut listeners);
                        }

                        Some(SurfaceEvent::Page(event)) => {
                            trace!(name = %event.name, "Page event");
                            if let Err(e) = surface.dispatch_page_event(&event) {
                                warn!(name = %event.name, error = %e, "Failed to dispatch page event");
                            }
                        }

                        None => {
                            debug!("Event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        if !listeners.is_empty() {
            debug!(count = listeners.len(), "Dropping listeners on shutdown");
        }

        debug!("Rendering context terminated");
    }

    /// Hands a load-state change to every listener, in registration order.
    fn dispatch_load(
        event: &LoadEvent,
        surface: &mut dyn RenderingSurface,
        listeners: &mut Vec<RegisteredListener>,
    ) {
        trace!(
            previous = %event.previous,
            state = %event.state,
            location = %event.location,
            main_frame = event.main_frame,
            "Load state changed"
        );

        listeners.retain_mut(|entry| match entry.listener.on_load_state(event, surface) {
            ListenerControl::Keep => true,
            ListenerControl::Remove => {
                trace!(listener_id = %entry.id, "Listener removed");
                false
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
