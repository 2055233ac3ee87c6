//! Check orchestrator.
//!
//! Turns one check request into exactly one [`CheckResult`]:
//!
//! 1. Obtain the access token, task id and code
//! 2. Schedule a [`NavigationWatcher`] and the form-page load on the
//!    rendering context (fire-and-forget)
//! 3. Wait on the completion signal, bounded by the configured timeout and
//!    the caller's [`CancellationToken`]
//! 4. Convert the outcome
//!
//! | Outcome | Result |
//! |---------|--------|
//! | bridge reported `1` | `Solved`, "All tests passed" |
//! | bridge reported anything else | `Failed`, "Tests failed" |
//! | deadline expired | `Unchecked`, "Checking took too much time" |
//! | wait cancelled | `Unchecked`, "Checking was cancelled" |
//! | page failed to load | reported, then `ConnectionFailed` |
//! | any other error | reported, then `Unchecked`, "Failed to launch checking" |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::CheckId;
use crate::protocol::{CheckResult, FormSubmissionPayload};
use crate::render::RenderHandle;

use super::assets::FormPage;
use super::collaborators::{ErrorReporter, LogReporter, TaskSource, TokenProvider};
use super::options::CheckOptions;
use super::signal::{CompletionTrigger, WaitOutcome, completion_signal};
use super::watcher::NavigationWatcher;

// ============================================================================
// Constants
// ============================================================================

/// Context passed to the [`ErrorReporter`].
pub const CHECK_FAILED_CONTEXT: &str = "Failed to check the task";

// ============================================================================
// CheckOrchestrator
// ============================================================================

/// Runs checks against the CheckiO service through a rendering context.
///
/// One orchestrator may run many checks one after another; every attempt
/// gets its own signal and watcher. The surface shows one page at a time, so
/// checks that overlap need a rendering context each.
pub struct CheckOrchestrator {
    renderer: RenderHandle,
    options: CheckOptions,
    form_url: String,
    /// Keeps the bundled form on disk while checks can still load it.
    _form_page: Option<FormPage>,
    tokens: Arc<dyn TokenProvider>,
    reporter: Arc<dyn ErrorReporter>,
}

impl fmt::Debug for CheckOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckOrchestrator")
            .field("renderer", &self.renderer)
            .field("options", &self.options)
            .field("form_url", &self.form_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl CheckOrchestrator {
    /// Creates an orchestrator driving `renderer`.
    ///
    /// When `options.form_page_url` is `None` the bundled test form is
    /// written to a temporary directory for the lifetime of the
    /// orchestrator.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Io`] if the bundled form cannot be written
    pub fn new(
        renderer: RenderHandle,
        options: CheckOptions,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        options.validate()?;

        let (form_url, form_page) = match &options.form_page_url {
            Some(url) => (url.clone(), None),
            None => {
                let page = FormPage::materialize()?;
                (page.url().to_string(), Some(page))
            }
        };

        debug!(form_url = %form_url, timeout_ms = options.timeout.as_millis(), "Orchestrator ready");

        Ok(Self {
            renderer,
            options,
            form_url,
            _form_page: form_page,
            tokens,
            reporter: Arc::new(LogReporter),
        })
    }

    /// Replaces the error reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl CheckOrchestrator {
    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Returns the URL the test form is loaded from.
    #[inline]
    #[must_use]
    pub fn form_page_url(&self) -> &str {
        &self.form_url
    }
}

// ============================================================================
// Checking
// ============================================================================

impl CheckOrchestrator {
    /// Checks `task` and returns its result.
    ///
    /// Never fails: every error is folded into the returned [`CheckResult`].
    pub async fn check(&self, task: &dyn TaskSource, cancel: &CancellationToken) -> CheckResult {
        let check_id = CheckId::generate();
        info!(check_id = %check_id, task_id = %task.task_id(), "Checking task");

        let result = match self.run(check_id, task, cancel).await {
            Ok(result) => result,

            Err(e) if e.is_cancelled() => CheckResult::cancelled(),

            Err(e) if e.is_connection_error() => {
                self.reporter.report(CHECK_FAILED_CONTEXT, &e);
                CheckResult::connection_failed()
            }

            Err(e) => {
                self.reporter.report(CHECK_FAILED_CONTEXT, &e);
                CheckResult::failed_to_check()
            }
        };

        info!(check_id = %check_id, result = %result, "Check finished");
        result
    }

    /// Checks `task` from a thread outside the runtime, blocking until done.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn check_blocking(
        &self,
        runtime: &Handle,
        task: &dyn TaskSource,
        cancel: &CancellationToken,
    ) -> CheckResult {
        runtime.block_on(self.check(task, cancel))
    }

    /// Runs one attempt; errors are converted by [`check`](Self::check).
    async fn run(
        &self,
        check_id: CheckId,
        task: &dyn TaskSource,
        cancel: &CancellationToken,
    ) -> Result<CheckResult> {
        let access_token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            token = self.tokens.access_token() => token?,
        };

        let payload = FormSubmissionPayload::new(
            access_token,
            task.task_id(),
            &self.options.interpreter,
            task.code()?,
            &self.options.target_url,
        );

        let (trigger, waiter) = completion_signal();
        self.schedule(check_id, payload, trigger.clone())?;

        match waiter.wait(self.options.timeout, cancel).await {
            WaitOutcome::Completed(result) if result.is_connection_failed() => Err(
                Error::connection_failed(format!("check {check_id}: the CheckiO page did not load")),
            ),

            WaitOutcome::Completed(result) => Ok(result),

            WaitOutcome::TimedOut => {
                warn!(check_id = %check_id, timeout_ms = self.options.timeout.as_millis(), "Check timed out");
                // Retires the watcher; the fired value is never read.
                trigger.fire(CheckResult::timed_out());
                Ok(CheckResult::timed_out())
            }

            WaitOutcome::Cancelled => {
                debug!(check_id = %check_id, "Check cancelled");
                // Retires the watcher; the fired value is never read.
                trigger.fire(CheckResult::cancelled());
                Err(Error::Cancelled)
            }

            WaitOutcome::Abandoned => Err(Error::RendererClosed),
        }
    }

    /// Registers the watcher and starts loading the form page.
    fn schedule(
        &self,
        check_id: CheckId,
        payload: FormSubmissionPayload,
        trigger: CompletionTrigger,
    ) -> Result<()> {
        let watcher = NavigationWatcher::new(
            check_id,
            payload,
            self.options.markers.clone(),
            trigger.clone(),
        );
        let form_url = self.form_url.clone();

        self.renderer.run_later(move |scope| {
            let listener_id = scope.add_listener(Box::new(watcher));
            debug!(check_id = %check_id, listener_id = %listener_id, "Watcher registered");

            if let Err(e) = scope.surface().load(&form_url) {
                warn!(check_id = %check_id, error = %e, "Failed to start loading the test form");
                trigger.fire(CheckResult::connection_failed());
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
