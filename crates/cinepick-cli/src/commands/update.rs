use super::progress_ui::RunProgressUI;
use super::Context;
use crate::output::Output;
use cinepick_core::ScrapeService;
use cinepick_models::{RunKind, RunOutcome};
use color_eyre::Result;
use serde_json::json;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run_update(context: &Context, full: bool, output: &Output) -> Result<()> {
    let kind = if full { RunKind::Full } else { RunKind::Quick };
    tracing::debug!(kind = %kind, "Update command started");

    context
        .config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration: {}", e))?;
    context
        .paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

    let service = ScrapeService::from_config(&context.config, &context.paths)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to set up scraper: {}", e))?;

    let start = Instant::now();
    let run = service.start_run(kind)?;
    let mut ui = RunProgressUI::new(kind.label(), output.is_human());
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut stop_sent = false;

    let outcome = loop {
        tokio::select! {
            outcome = run.wait() => break outcome,
            _ = tokio::signal::ctrl_c(), if !stop_sent => {
                stop_sent = true;
                run.request_stop();
                output.warn("Stop requested; finishing in-flight pages without saving...");
            }
            _ = ticker.tick() => ui.update(&run.progress()),
        }
    };
    ui.finish(&run.progress());

    let elapsed = start.elapsed();
    if !output.is_human() {
        output.json(&json!({
            "success": outcome.is_success(),
            "kind": kind.to_string(),
            "status": outcome.status(),
            "outcome": outcome,
            "catalog": service.catalog().path().display().to_string(),
            "duration_seconds": elapsed.as_secs_f64(),
        }));
        return Ok(());
    }

    match &outcome {
        RunOutcome::Completed { collected, written } => output.success(format!(
            "{} complete: {} movies collected, {} written to {} in {:.1}s",
            kind.label(),
            collected,
            written,
            service.catalog().path().display(),
            elapsed.as_secs_f64()
        )),
        RunOutcome::Stopped => {
            output.warn(format!("{} stopped; catalog left unchanged", kind.label()))
        }
        RunOutcome::EmptyFallback => output.warn(outcome.status()),
        RunOutcome::Error { .. } => output.error(outcome.status()),
    }

    Ok(())
}
