//! In-memory rendering surface.
//!
//! [`MemorySurface`] plays the part of an embedded browser without one.
//! Navigations are resolved against a route table: the first route whose
//! marker is contained in the requested URL decides what happens, and a URL
//! no route matches fails to load, like an unreachable host.
//!
//! # Example
//!
//! ```
//! use checkio_bridge::protocol::PageEvent;
//! use checkio_bridge::surface::{MemorySurface, PageSpec};
//!
//! let surface = MemorySurface::new()
//!     .route("checkioTestForm.html", PageSpec::test_form())
//!     .route("checkio.org", PageSpec::loads().emits(PageEvent::check_done(true)));
//! let probe = surface.probe();
//! assert!(probe.loads().is_empty());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::check::ResultBridge;
use crate::error::{Error, Result};
use crate::protocol::payload::{
    ACCESS_TOKEN_FIELD, CODE_FIELD, INTERPRETER_FIELD, TASK_ID_FIELD, TEST_FORM_ID,
};
use crate::protocol::{LoadEvent, PageEvent, SurfaceEvent};
use crate::render::EventSink;

use super::RenderingSurface;

// ============================================================================
// Constants
// ============================================================================

/// Script fragment that registers a page listener.
const ADD_EVENT_LISTENER: &str = "addEventListener(";

// ============================================================================
// PageSpec
// ============================================================================

/// What happens when a route is navigated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Load,
    Fail,
    Stall,
}

/// Behaviour of one page in the route table.
#[derive(Debug, Clone)]
pub struct PageSpec {
    outcome: PageOutcome,
    reports: usize,
    elements: Vec<String>,
    on_ready: Vec<PageEvent>,
}

impl PageSpec {
    fn with_outcome(outcome: PageOutcome) -> Self {
        Self {
            outcome,
            reports: 1,
            elements: Vec::new(),
            on_ready: Vec::new(),
        }
    }

    /// The page loads successfully.
    #[must_use]
    pub fn loads() -> Self {
        Self::with_outcome(PageOutcome::Load)
    }

    /// The page fails to load.
    #[must_use]
    pub fn fails() -> Self {
        Self::with_outcome(PageOutcome::Fail)
    }

    /// The page starts loading and never finishes.
    #[must_use]
    pub fn stalls() -> Self {
        Self::with_outcome(PageOutcome::Stall)
    }

    /// The bundled test form: loads and carries the five contract ids.
    #[must_use]
    pub fn test_form() -> Self {
        Self::loads().with_elements([
            ACCESS_TOKEN_FIELD,
            TASK_ID_FIELD,
            INTERPRETER_FIELD,
            CODE_FIELD,
            TEST_FORM_ID,
        ])
    }

    /// Reports the successful load twice, as some engines do.
    #[must_use]
    pub fn reported_twice(mut self) -> Self {
        self.reports = 2;
        self
    }

    /// Declares element ids present on the page.
    #[must_use]
    pub fn with_elements(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.elements.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Dispatches `event` right after the page has loaded.
    #[must_use]
    pub fn emits(mut self, event: PageEvent) -> Self {
        self.on_ready.push(event);
        self
    }
}

// ============================================================================
// Submission
// ============================================================================

/// A recorded form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Submitted form id.
    pub form_id: String,
    /// Form action at submit time.
    pub action: String,
    /// Element values on the page at submit time.
    pub values: FxHashMap<String, String>,
}

impl Submission {
    /// Returns the submitted value of `element_id`.
    #[must_use]
    pub fn value(&self, element_id: &str) -> Option<&str> {
        self.values.get(element_id).map(String::as_str)
    }
}

// ============================================================================
// MemoryState
// ============================================================================

/// Shared state between the surface and its probes.
#[derive(Default)]
struct MemoryState {
    /// Route table, first match wins.
    routes: Vec<(String, PageSpec)>,
    /// Current document location.
    location: String,
    /// Element ids of the current document.
    elements: FxHashSet<String>,
    /// Element values of the current document.
    values: FxHashMap<String, String>,
    /// Form actions of the current document.
    form_actions: FxHashMap<String, String>,
    /// Event names with a page listener installed in the current document.
    page_listeners: Vec<String>,
    /// Bridges exposed on the current document.
    bridges: FxHashMap<String, ResultBridge>,
    /// Every requested navigation, in order.
    loads: Vec<String>,
    /// Every form submission, in order.
    submissions: Vec<Submission>,
    /// Every executed script, in order.
    scripts: Vec<String>,
    /// Number of `expose_bridge` calls over the surface lifetime.
    bridge_installs: usize,
}

impl MemoryState {
    fn require_element(&self, element_id: &str) -> Result<()> {
        if self.elements.contains(element_id) {
            Ok(())
        } else {
            Err(Error::element_not_found(element_id))
        }
    }

    /// Applies a navigation and returns the events it produces.
    fn navigate(&mut self, url: &str) -> Vec<SurfaceEvent> {
        self.loads.push(url.to_string());

        let page = self
            .routes
            .iter()
            .find(|(marker, _)| url.contains(marker.as_str()))
            .map(|(_, page)| page.clone())
            .unwrap_or_else(PageSpec::fails);

        let mut events = vec![SurfaceEvent::from(LoadEvent::loading(url))];

        match page.outcome {
            PageOutcome::Load => {
                self.location = url.to_string();
                self.elements = page.elements.into_iter().collect();
                self.values.clear();
                self.form_actions.clear();
                self.page_listeners.clear();
                self.bridges.clear();

                for _ in 0..page.reports {
                    events.push(LoadEvent::succeeded(url).into());
                }
                events.extend(page.on_ready.into_iter().map(SurfaceEvent::from));
            }
            PageOutcome::Fail => events.push(LoadEvent::failed(url).into()),
            PageOutcome::Stall => {}
        }

        events
    }
}

// ============================================================================
// MemorySurface
// ============================================================================

/// In-memory [`RenderingSurface`].
pub struct MemorySurface {
    state: Arc<Mutex<MemoryState>>,
    sink: Option<EventSink>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemorySurface")
            .field("location", &state.location)
            .field("routes", &state.routes.len())
            .field("attached", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl MemorySurface {
    /// Creates a surface with an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            sink: None,
        }
    }

    /// Adds a route for URLs containing `marker`.
    #[must_use]
    pub fn route(self, marker: impl Into<String>, page: PageSpec) -> Self {
        self.state.lock().routes.push((marker.into(), page));
        self
    }

    /// Returns a probe onto this surface's recorded state.
    #[must_use]
    pub fn probe(&self) -> SurfaceProbe {
        SurfaceProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Navigates and reports the resulting events, if attached.
    fn navigate(&mut self, url: &str) {
        let events = self.state.lock().navigate(url);
        debug!(url = %url, events = events.len(), "Memory surface navigated");

        if let Some(sink) = &self.sink {
            for event in events {
                sink.emit(event);
            }
        }
    }

    /// Navigates once the current callback has returned, as a browser
    /// does for a form submission.
    ///
    /// Falls back to navigating in place when detached or outside a runtime.
    fn navigate_after_callback(&mut self, url: String) {
        let (Some(sink), Ok(runtime)) = (self.sink.clone(), Handle::try_current()) else {
            self.navigate(&url);
            return;
        };

        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            tokio::task::yield_now().await;
            let events = state.lock().navigate(&url);
            debug!(url = %url, events = events.len(), "Memory surface navigated");
            for event in events {
                sink.emit(event);
            }
        });
    }
}

// ============================================================================
// MemorySurface - RenderingSurface
// ============================================================================

impl RenderingSurface for MemorySurface {
    fn attach(&mut self, sink: EventSink) {
        self.sink = Some(sink);
    }

    fn load(&mut self, url: &str) -> Result<()> {
        self.navigate(url);
        Ok(())
    }

    fn location(&self) -> String {
        self.state.lock().location.clone()
    }

    fn execute_script(&mut self, script: &str) -> Result<Value> {
        let mut state = self.state.lock();
        state.scripts.push(script.to_string());

        if let Some(event_name) = listened_event(script) {
            trace!(event = %event_name, "Page listener installed");
            state.page_listeners.push(event_name);
        }

        Ok(Value::Null)
    }

    fn set_element_value(&mut self, element_id: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.require_element(element_id)?;
        state
            .values
            .insert(element_id.to_string(), value.to_string());
        Ok(())
    }

    fn set_form_action(&mut self, form_id: &str, action: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.require_element(form_id)?;
        state
            .form_actions
            .insert(form_id.to_string(), action.to_string());
        Ok(())
    }

    fn submit_form(&mut self, form_id: &str) -> Result<()> {
        let action = {
            let mut state = self.state.lock();
            state.require_element(form_id)?;

            let action = state
                .form_actions
                .get(form_id)
                .cloned()
                .ok_or_else(|| Error::script(format!("form #{form_id} has no action")))?;

            let submission = Submission {
                form_id: form_id.to_string(),
                action: action.clone(),
                values: state.values.clone(),
            };
            state.submissions.push(submission);
            action
        };

        self.navigate_after_callback(action);
        Ok(())
    }

    fn expose_bridge(&mut self, name: &str, bridge: ResultBridge) -> Result<()> {
        let mut state = self.state.lock();
        state.bridges.insert(name.to_string(), bridge);
        state.bridge_installs += 1;
        Ok(())
    }

    fn dispatch_page_event(&mut self, event: &PageEvent) -> Result<()> {
        let (listeners, bridges) = {
            let state = self.state.lock();
            let listeners = state
                .page_listeners
                .iter()
                .filter(|name| **name == event.name)
                .count();
            let bridges: Vec<ResultBridge> = state.bridges.values().cloned().collect();
            (listeners, bridges)
        };

        trace!(name = %event.name, listeners, "Dispatching page event");

        for _ in 0..listeners {
            for bridge in &bridges {
                bridge.handle_page_event(event);
            }
        }
        Ok(())
    }
}

/// Extracts the event name from an `addEventListener("name", …)` script.
fn listened_event(script: &str) -> Option<String> {
    let start = script.find(ADD_EVENT_LISTENER)? + ADD_EVENT_LISTENER.len();
    let rest = script[start..].trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

// ============================================================================
// SurfaceProbe
// ============================================================================

/// Read access to what a [`MemorySurface`] recorded.
#[derive(Clone)]
pub struct SurfaceProbe {
    state: Arc<Mutex<MemoryState>>,
}

impl fmt::Debug for SurfaceProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceProbe").finish_non_exhaustive()
    }
}

impl SurfaceProbe {
    /// Returns the current location.
    #[must_use]
    pub fn location(&self) -> String {
        self.state.lock().location.clone()
    }

    /// Returns every requested navigation.
    #[must_use]
    pub fn loads(&self) -> Vec<String> {
        self.state.lock().loads.clone()
    }

    /// Returns every form submission.
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    /// Returns the current value of `element_id`.
    #[must_use]
    pub fn value(&self, element_id: &str) -> Option<String> {
        self.state.lock().values.get(element_id).cloned()
    }

    /// Returns how many times a bridge was exposed.
    #[must_use]
    pub fn bridge_installs(&self) -> usize {
        self.state.lock().bridge_installs
    }

    /// Returns every executed script.
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    /// Returns how many page listeners for `event_name` are installed.
    #[must_use]
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.state
            .lock()
            .page_listeners
            .iter()
            .filter(|name| *name == event_name)
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    use crate::check::bridge::listener_script;
    use crate::check::signal::completion_signal;
    use crate::identifiers::CheckId;
    use crate::protocol::{CHECK_DONE_EVENT, CheckResult, LoadState};

    fn attached(surface: &mut MemorySurface) -> mpsc::UnboundedReceiver<SurfaceEvent> {
        let (sink, rx) = EventSink::channel();
        surface.attach(sink);
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SurfaceEvent>) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_unrouted_url_fails() {
        let mut surface = MemorySurface::new();
        let mut rx = attached(&mut surface);

        surface.load("https://unreachable.example").expect("load");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            SurfaceEvent::Load(e) if e.state == LoadState::Failed
        ));
    }

    #[test]
    fn test_reported_twice_and_page_events() {
        let mut surface = MemorySurface::new().route(
            "checkio.org",
            PageSpec::loads()
                .reported_twice()
                .emits(PageEvent::check_done(false)),
        );
        let mut rx = attached(&mut surface);

        surface.load("https://py.checkio.org/x").expect("load");

        let events = drain(&mut rx);
        let successes = events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::Load(e) if e.is_success()))
            .count();
        assert_eq!(successes, 2);
        assert!(matches!(events.last(), Some(SurfaceEvent::Page(_))));
        assert_eq!(surface.location(), "https://py.checkio.org/x");
    }

    #[test]
    fn test_form_submission_records_values() {
        let mut surface = MemorySurface::new()
            .route("form.html", PageSpec::test_form())
            .route("target", PageSpec::stalls());
        let probe = surface.probe();

        surface.load("file:///form.html").expect("load");
        surface.set_element_value("task-id", "42").expect("set");
        surface
            .set_form_action("test-form", "https://target/submit")
            .expect("action");
        surface.submit_form("test-form").expect("submit");

        let submissions = probe.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].action, "https://target/submit");
        assert_eq!(submissions[0].value("task-id"), Some("42"));
        assert_eq!(
            probe.loads(),
            vec!["file:///form.html", "https://target/submit"]
        );
    }

    #[tokio::test]
    async fn test_submission_navigates_after_callback() {
        let mut surface = MemorySurface::new()
            .route("form.html", PageSpec::test_form())
            .route("target", PageSpec::loads());
        let probe = surface.probe();
        let mut rx = attached(&mut surface);

        surface.load("file:///form.html").expect("load");
        drain(&mut rx);
        surface
            .set_form_action("test-form", "https://target/submit")
            .expect("action");
        surface.submit_form("test-form").expect("submit");

        assert_eq!(probe.location(), "file:///form.html");
        assert!(surface.set_element_value("code", "x").is_ok());
        assert!(drain(&mut rx).is_empty());

        let event = rx.recv().await.expect("loading event");
        assert!(matches!(
            event,
            SurfaceEvent::Load(ref e) if e.state == LoadState::Loading && e.location == "https://target/submit"
        ));
        assert_eq!(probe.location(), "https://target/submit");
        assert_eq!(
            probe.loads(),
            vec!["file:///form.html", "https://target/submit"]
        );
    }

    #[test]
    fn test_missing_element() {
        let mut surface = MemorySurface::new().route("page", PageSpec::loads());
        surface.load("page").expect("load");

        let err = surface.set_element_value("code", "x").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { ref element_id } if element_id == "code"));
    }

    #[test]
    fn test_submit_without_action() {
        let mut surface = MemorySurface::new().route("form", PageSpec::test_form());
        surface.load("form").expect("load");

        assert!(matches!(
            surface.submit_form("test-form"),
            Err(Error::Script { .. })
        ));
    }

    #[test]
    fn test_page_event_reaches_exposed_bridge() {
        let mut surface = MemorySurface::new().route("result", PageSpec::loads());
        let probe = surface.probe();
        surface.load("result").expect("load");

        let (trigger, mut waiter) = completion_signal();
        surface
            .expose_bridge("checkioHandler", ResultBridge::new(CheckId::generate(), trigger))
            .expect("expose");
        surface.execute_script(&listener_script()).expect("script");
        assert_eq!(probe.listener_count(CHECK_DONE_EVENT), 1);

        surface
            .dispatch_page_event(&PageEvent::check_done(true))
            .expect("dispatch");
        assert_eq!(waiter.try_result(), Some(CheckResult::solved()));
    }

    #[test]
    fn test_navigation_resets_page_listeners() {
        let mut surface = MemorySurface::new().route("page", PageSpec::loads());
        let probe = surface.probe();
        surface.load("page-1").expect("load");
        surface.execute_script(&listener_script()).expect("script");

        surface.load("page-2").expect("load");
        assert_eq!(probe.listener_count(CHECK_DONE_EVENT), 0);
        assert_eq!(probe.scripts().len(), 1);
    }

    #[test]
    fn test_listened_event() {
        assert_eq!(
            listened_event(r#"window.addEventListener("checkio:checkDone", f, false)"#),
            Some("checkio:checkDone".to_string())
        );
        assert_eq!(listened_event("document.title"), None);
    }
}
