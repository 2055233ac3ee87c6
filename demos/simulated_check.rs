//! Simulated CheckiO check.
//!
//! Demonstrates:
//! - Spawning a rendering context over an in-memory surface
//! - Running a passing, a failing and a timed-out check
//! - Cancelling a check while it waits
//!
//! Usage:
//!   cargo run --example simulated_check
//!   cargo run --example simulated_check -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use checkio_bridge::{
    CancellationToken, CheckOptions, CheckOrchestrator, MemorySurface, PageEvent, PageSpec,
    RenderContext, Result, StaticToken, SubmittedTask,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const PASSING_TARGET: &str = "https://py.checkio.org/mission/check-html-output/pass";
const FAILING_TARGET: &str = "https://py.checkio.org/mission/check-html-output/fail";
const SLOW_TARGET: &str = "https://py.checkio.org/mission/check-html-output/slow";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Simulated CheckiO check ===\n");

    let surface = MemorySurface::new()
        .route("checkioTestForm.html", PageSpec::test_form())
        .route(
            "/pass",
            PageSpec::loads()
                .reported_twice()
                .emits(PageEvent::check_done(true)),
        )
        .route("/fail", PageSpec::loads().emits(PageEvent::check_done(false)))
        .route("/slow", PageSpec::stalls());
    let probe = surface.probe();
    let renderer = RenderContext::spawn(surface);
    let tokens = Arc::new(StaticToken::new("demo-token"));
    let task = SubmittedTask::new("42", "print(1)");

    // ========================================================================
    // Passing and failing checks
    // ========================================================================

    for target in [PASSING_TARGET, FAILING_TARGET] {
        let options = CheckOptions::new().with_target_url(target);
        let orchestrator = CheckOrchestrator::new(renderer.clone(), options, tokens.clone())?;

        let result = orchestrator.check(&task, &CancellationToken::new()).await;
        println!("[Check] {target}");
        println!("        {result}\n");
    }

    // ========================================================================
    // Timeout
    // ========================================================================

    let options = CheckOptions::new()
        .with_target_url(SLOW_TARGET)
        .with_timeout(Duration::from_secs(1));
    let orchestrator = CheckOrchestrator::new(renderer.clone(), options, tokens.clone())?;

    let result = orchestrator.check(&task, &CancellationToken::new()).await;
    println!("[Check] {SLOW_TARGET} (1s timeout)");
    println!("        {result}\n");

    // ========================================================================
    // Cancellation
    // ========================================================================

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let result = orchestrator.check(&task, &cancel).await;
    println!("[Check] {SLOW_TARGET} (cancelled after 200ms)");
    println!("        {result}\n");

    println!(
        "[Surface] {} loads, {} submissions, {} bridge installs",
        probe.loads().len(),
        probe.submissions().len(),
        probe.bridge_installs()
    );

    renderer.shutdown();
    println!("\n=== Done ===");
    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "checkio_bridge=debug"
    } else {
        "checkio_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
