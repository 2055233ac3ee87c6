//! End-to-end check flow against the in-memory surface.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkio_bridge::check::CHECK_FAILED_CONTEXT;
use checkio_bridge::{
    CancellationToken, CheckOptions, CheckOrchestrator, CheckResult, CheckStatus, Error, ErrorReporter,
    MemorySurface, PageEvent, PageSpec, RenderContext, Result, StaticToken, SubmittedTask,
    SurfaceProbe, TaskSource, TokenProvider,
};
use parking_lot::Mutex;
use tokio::time::Instant;

// ============================================================================
// Fixtures
// ============================================================================

const TARGET_URL: &str = "https://checkio.example/submit";
const RESULT_HOST: &str = "checkio.example";

#[derive(Default)]
struct RecordingReporter {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, context: &str, error: &Error) {
        self.reports
            .lock()
            .push((context.to_string(), error.to_string()));
    }
}

struct ExpiredToken;

#[async_trait]
impl TokenProvider for ExpiredToken {
    async fn access_token(&self) -> Result<String> {
        Err(Error::auth("refresh token expired"))
    }
}

struct UnreadableTask;

impl TaskSource for UnreadableTask {
    fn task_id(&self) -> String {
        "42".to_string()
    }

    fn code(&self) -> Result<String> {
        Err(Error::task("solution file is gone"))
    }
}

fn options() -> CheckOptions {
    CheckOptions::new()
        .with_target_url(TARGET_URL)
        .with_result_host_marker(RESULT_HOST)
}

fn task() -> SubmittedTask {
    SubmittedTask::new("42", "print(1)")
}

struct Harness {
    orchestrator: CheckOrchestrator,
    probe: SurfaceProbe,
    reporter: Arc<RecordingReporter>,
}

fn harness(surface: MemorySurface, options: CheckOptions) -> anyhow::Result<Harness> {
    harness_with_tokens(surface, options, Arc::new(StaticToken::new("tok123")))
}

fn harness_with_tokens(
    surface: MemorySurface,
    options: CheckOptions,
    tokens: Arc<dyn TokenProvider>,
) -> anyhow::Result<Harness> {
    let probe = surface.probe();
    let reporter = Arc::new(RecordingReporter::default());
    let orchestrator = CheckOrchestrator::new(RenderContext::spawn(surface), options, tokens)?
        .with_reporter(reporter.clone());

    Ok(Harness {
        orchestrator,
        probe,
        reporter,
    })
}

fn surface_with_result(result_page: PageSpec) -> MemorySurface {
    MemorySurface::new()
        .route("checkioTestForm.html", PageSpec::test_form())
        .route(RESULT_HOST, result_page)
}

// ============================================================================
// Verdicts
// ============================================================================

#[tokio::test]
async fn test_end_to_end_solved() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(true)));
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result.status(), CheckStatus::Solved);
    assert_eq!(result.message(), "All tests passed");

    let submissions = h.probe.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].action, TARGET_URL);
    assert_eq!(submissions[0].value("access-token"), Some("tok123"));
    assert_eq!(submissions[0].value("task-id"), Some("42"));
    assert_eq!(submissions[0].value("interpreter"), Some("python-3"));
    assert_eq!(submissions[0].value("code"), Some("print(1)"));

    assert_eq!(
        h.probe.loads(),
        vec![h.orchestrator.form_page_url().to_string(), TARGET_URL.to_string()]
    );
    assert!(h.reporter.reports().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tests_failed() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(false)));
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::tests_failed());
    assert!(h.reporter.reports().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_result_page_reported_twice_installs_bridge_once() -> anyhow::Result<()> {
    let surface = surface_with_result(
        PageSpec::loads()
            .reported_twice()
            .emits(PageEvent::check_done(true)),
    );
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert!(result.is_solved());
    assert_eq!(h.probe.bridge_installs(), 1);
    Ok(())
}

#[tokio::test]
async fn test_javascript_course_submits_js_interpreter() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(true)));
    let options = options().with_interpreter("js-node");
    let h = harness(surface, options)?;

    h.orchestrator.check(&task(), &CancellationToken::new()).await;

    let submissions = h.probe.submissions();
    assert_eq!(submissions[0].value("interpreter"), Some("js-node"));
    Ok(())
}

#[tokio::test]
async fn test_form_page_on_result_host_arms_bridge_on_result_page() -> anyhow::Result<()> {
    let hosted_form = "https://checkio.example/static/checkioTestForm.html";
    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(true)));
    let options = options()
        .with_form_page_url(hosted_form)
        .with_timeout(Duration::from_secs(5));
    let h = harness(surface, options)?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::solved());
    assert_eq!(h.probe.bridge_installs(), 1);
    assert_eq!(h.probe.location(), TARGET_URL);
    assert_eq!(
        h.probe.loads(),
        vec![hosted_form.to_string(), TARGET_URL.to_string()]
    );
    Ok(())
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_result_page_failure_is_connection_failed() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::fails());
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::connection_failed());
    assert_eq!(h.probe.submissions().len(), 1);

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, CHECK_FAILED_CONTEXT);
    assert!(reports[0].1.starts_with("Connection failed"));
    Ok(())
}

#[tokio::test]
async fn test_form_page_failure_is_connection_failed() -> anyhow::Result<()> {
    let surface = MemorySurface::new();
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert!(result.is_connection_failed());
    assert!(h.probe.submissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_token_failure_fails_to_check() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads());
    let h = harness_with_tokens(surface, options(), Arc::new(ExpiredToken))?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::failed_to_check());
    assert!(h.probe.loads().is_empty());

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "Failed to check the task");
    assert!(reports[0].1.contains("refresh token expired"));
    Ok(())
}

#[tokio::test]
async fn test_unreadable_code_fails_to_check() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads());
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&UnreadableTask, &CancellationToken::new()).await;

    assert_eq!(result.status(), CheckStatus::Unchecked);
    assert_eq!(result.message(), "Failed to launch checking");
    assert_eq!(h.reporter.reports().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_form_field_fails_to_check() -> anyhow::Result<()> {
    let surface = MemorySurface::new()
        .route(
            "checkioTestForm.html",
            PageSpec::loads().with_elements(["access-token", "task-id", "test-form"]),
        )
        .route(RESULT_HOST, PageSpec::loads());
    let h = harness(surface, options())?;

    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::failed_to_check());
    assert!(h.probe.submissions().is_empty());
    Ok(())
}

// ============================================================================
// Deadline and Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_returns_at_deadline() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::stalls());
    let h = harness(surface, options())?;

    let start = Instant::now();
    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;
    let elapsed = start.elapsed();

    assert_eq!(result.status(), CheckStatus::Unchecked);
    assert_eq!(result.message(), "Checking took too much time");
    assert!(elapsed >= Duration::from_secs(30), "returned early: {elapsed:?}");
    assert!(
        elapsed < Duration::from_secs(30) + Duration::from_millis(50),
        "returned late: {elapsed:?}"
    );
    assert!(h.reporter.reports().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::stalls());
    let h = harness(surface, options().with_timeout(Duration::from_secs(5)))?;

    let start = Instant::now();
    let result = h.orchestrator.check(&task(), &CancellationToken::new()).await;

    assert_eq!(result, CheckResult::timed_out());
    assert!(start.elapsed() < Duration::from_secs(6));
    Ok(())
}

#[tokio::test]
async fn test_cancel_before_any_event() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(true)));
    let h = harness(surface, options())?;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = h.orchestrator.check(&task(), &cancel).await;

    assert_eq!(result.status(), CheckStatus::Unchecked);
    assert_eq!(result.message(), "Checking was cancelled");
    assert_ne!(result, CheckResult::timed_out());
    assert!(h.reporter.reports().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting() -> anyhow::Result<()> {
    let surface = surface_with_result(PageSpec::stalls());
    let h = harness(surface, options())?;

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = h.orchestrator.check(&task(), &cancel).await;

    assert_eq!(result, CheckResult::cancelled());
    assert!(start.elapsed() < Duration::from_secs(30));
    assert_eq!(h.probe.submissions().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_attempt_after_timeout_is_independent() -> anyhow::Result<()> {
    let surface = MemorySurface::new()
        .route("checkioTestForm.html", PageSpec::test_form())
        .route("/slow", PageSpec::stalls())
        .route(RESULT_HOST, PageSpec::loads().emits(PageEvent::check_done(true)));
    let probe = surface.probe();
    let renderer = RenderContext::spawn(surface);
    let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken::new("tok123"));

    let slow = CheckOrchestrator::new(
        renderer.clone(),
        options().with_target_url("https://checkio.example/slow"),
        tokens.clone(),
    )?;
    let fast = CheckOrchestrator::new(renderer, options(), tokens)?;

    let first = slow.check(&task(), &CancellationToken::new()).await;
    let second = fast.check(&task(), &CancellationToken::new()).await;

    assert_eq!(first, CheckResult::timed_out());
    assert_eq!(second, CheckResult::solved());
    assert_eq!(probe.submissions().len(), 2);
    assert_eq!(probe.bridge_installs(), 1);
    Ok(())
}

// ============================================================================
// Blocking Entry Point
// ============================================================================

#[test]
fn test_check_blocking_from_worker_thread() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let surface = surface_with_result(PageSpec::loads().emits(PageEvent::check_done(true)));
    let renderer = RenderContext::spawn_on(surface, runtime.handle());
    let orchestrator = CheckOrchestrator::new(
        renderer,
        options(),
        Arc::new(StaticToken::new("tok123")),
    )?;

    let handle = runtime.handle().clone();
    let result = std::thread::spawn(move || {
        orchestrator.check_blocking(&handle, &task(), &CancellationToken::new())
    })
    .join()
    .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;

    assert_eq!(result, CheckResult::solved());
    Ok(())
}
