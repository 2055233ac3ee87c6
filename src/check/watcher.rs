//! Navigation watcher.
//!
//! Translates the surface's load-state stream into the two-page
//! interaction of a check attempt.
//!
//! # State Machine
//!
//! ```text
//!            form page loaded             result host loaded (once)
//!   Init ──────────────────────▶ FormPageReady ───────────────▶ ResultPageReady
//!     │      fill + submit             │          expose bridge       │
//!     │                                │          install listener    │
//!     └───────────────┬────────────────┴──────────────────────────────┘
//!                     │ main-frame load failed          │ signal fired
//!                     ▼                                 ▼
//!                 LoadFailed                           Done
//! ```
//!
//! Every transition runs on the rendering context and only main-frame
//! loads drive it. Locations are matched by substring against
//! [`PageMarkers`]; the form page never arms the bridge, even when it is
//! served from the service host.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::error::Result;
use crate::identifiers::CheckId;
use crate::protocol::payload::TEST_FORM_ID;
use crate::protocol::{CheckResult, FormSubmissionPayload, LoadEvent, LoadState};
use crate::render::{ListenerControl, LoadListener};
use crate::surface::RenderingSurface;

use super::bridge::{BRIDGE_MEMBER, ResultBridge, listener_script};
use super::options::PageMarkers;
use super::signal::CompletionTrigger;

// ============================================================================
// Constants
// ============================================================================

/// Applies the CheckiO background to the result page.
const RESULT_PAGE_STYLE_SCRIPT: &str =
    r#"document.documentElement.setAttribute("style", "background-color : #DEE7F6;");"#;

// ============================================================================
// Phase
// ============================================================================

/// Progress of one check attempt through the page flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Form page requested, nothing loaded yet.
    #[default]
    Init,
    /// Form filled and submitted.
    FormPageReady,
    /// Result bridge armed on the service page.
    ResultPageReady,
    /// A main-frame load failed.
    LoadFailed,
    /// The completion signal fired.
    Done,
}

impl Phase {
    /// Returns `true` once no further transitions are processed.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::LoadFailed | Self::Done)
    }
}

// ============================================================================
// NavigationState
// ============================================================================

/// Per-attempt state, owned by the watcher on the rendering context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    phase: Phase,
    visited: bool,
}

impl NavigationState {
    /// Returns the current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` once the result bridge was installed.
    #[inline]
    #[must_use]
    pub fn visited(&self) -> bool {
        self.visited
    }
}

// ============================================================================
// NavigationWatcher
// ============================================================================

/// Load listener driving one check attempt.
pub struct NavigationWatcher {
    check_id: CheckId,
    payload: FormSubmissionPayload,
    markers: PageMarkers,
    trigger: CompletionTrigger,
    bridge: ResultBridge,
    state: NavigationState,
}

impl fmt::Debug for NavigationWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationWatcher")
            .field("check_id", &self.check_id)
            .field("state", &self.state)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

impl NavigationWatcher {
    /// Creates a watcher that reports through `trigger`.
    #[must_use]
    pub fn new(
        check_id: CheckId,
        payload: FormSubmissionPayload,
        markers: PageMarkers,
        trigger: CompletionTrigger,
    ) -> Self {
        let bridge = ResultBridge::new(check_id, trigger.clone());
        Self {
            check_id,
            payload,
            markers,
            trigger,
            bridge,
            state: NavigationState::default(),
        }
    }

    /// Returns the attempt state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Returns the bridge this watcher exposes on the result page.
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &ResultBridge {
        &self.bridge
    }

    /// Returns the trigger this watcher fires.
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> &CompletionTrigger {
        &self.trigger
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Runs the entry actions matching a successful load of `location`.
    fn advance(&mut self, location: &str, surface: &mut dyn RenderingSurface) -> Result<()> {
        let is_form_page = self.markers.is_form_page(location);
        let is_result_host = self.markers.is_result_host(location);
        let is_result_page = self.markers.is_result_page(location);

        if is_form_page {
            if self.state.phase == Phase::Init {
                self.submit_form(surface)?;
                self.state.phase = Phase::FormPageReady;
            }
        } else if is_result_host
            && self.state.phase == Phase::FormPageReady
            && !self.state.visited
        {
            self.state.visited = true;
            self.install_bridge(surface)?;
            self.state.phase = Phase::ResultPageReady;
        }

        if is_result_page && let Err(e) = surface.execute_script(RESULT_PAGE_STYLE_SCRIPT) {
            warn!(check_id = %self.check_id, error = %e, "Failed to style result page");
        }

        if !(is_form_page || is_result_host || is_result_page) {
            trace!(check_id = %self.check_id, location = %location, "Ignoring unrelated page");
        }

        Ok(())
    }

    /// Fills the test form and submits it to the target URL.
    fn submit_form(&self, surface: &mut dyn RenderingSurface) -> Result<()> {
        for (element_id, value) in self.payload.fields() {
            surface.set_element_value(element_id, value)?;
        }
        surface.set_form_action(TEST_FORM_ID, self.payload.target_url())?;
        surface.submit_form(TEST_FORM_ID)?;

        debug!(
            check_id = %self.check_id,
            target = %self.payload.target_url(),
            "Test form submitted"
        );
        Ok(())
    }

    /// Exposes the result bridge and the `checkio:checkDone` listener.
    fn install_bridge(&self, surface: &mut dyn RenderingSurface) -> Result<()> {
        surface.expose_bridge(BRIDGE_MEMBER, self.bridge.clone())?;
        surface.execute_script(&listener_script())?;

        debug!(check_id = %self.check_id, "Result bridge installed");
        Ok(())
    }
}

// ============================================================================
// NavigationWatcher - LoadListener
// ============================================================================

impl LoadListener for NavigationWatcher {
    fn on_load_state(
        &mut self,
        event: &LoadEvent,
        surface: &mut dyn RenderingSurface,
    ) -> ListenerControl {
        if self.state.phase.is_terminal() {
            return ListenerControl::Remove;
        }

        if self.trigger.has_fired() {
            trace!(check_id = %self.check_id, "Attempt already complete");
            self.state.phase = Phase::Done;
            return ListenerControl::Remove;
        }

        match event.state {
            LoadState::Failed if !event.main_frame => {
                debug!(
                    check_id = %self.check_id,
                    location = %event.location,
                    "Ignoring sub-frame load failure"
                );
                ListenerControl::Keep
            }

            LoadState::Failed => {
                warn!(check_id = %self.check_id, location = %event.location, "Page failed to load");
                self.trigger.fire(CheckResult::connection_failed());
                self.state.phase = Phase::LoadFailed;
                ListenerControl::Remove
            }

            LoadState::Succeeded if !event.main_frame => {
                trace!(
                    check_id = %self.check_id,
                    location = %event.location,
                    "Ignoring sub-frame load"
                );
                ListenerControl::Keep
            }

            LoadState::Succeeded => match self.advance(&event.location, surface) {
                Ok(()) => ListenerControl::Keep,
                Err(e) => {
                    error!(
                        check_id = %self.check_id,
                        location = %event.location,
                        error = %e,
                        "Page broke the check contract"
                    );
                    self.trigger.fire(CheckResult::failed_to_check());
                    self.state.phase = Phase::Done;
                    ListenerControl::Remove
                }
            },

            LoadState::Idle | LoadState::Loading => ListenerControl::Keep,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
