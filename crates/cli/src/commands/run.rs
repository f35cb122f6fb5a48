//! Run command implementation.

use std::path::Path;
use std::time::{Duration, Instant};

use miette::{Result, miette};
use tessera_engine::RuntimeConfig;
use tokio::time::{self, MissedTickBehavior};

use crate::output;
use crate::runtime::Runtime;

/// Loads the configured extensions and drives frames.
///
/// `frames` overrides the config; 0 runs until Ctrl-C.
pub async fn execute(config_path: &Path, frames: Option<u64>) -> Result<()> {
    let config = RuntimeConfig::from_file(config_path)
        .map_err(|e| miette!("Failed to load {}: {}", config_path.display(), e))?;
    let frames = frames.unwrap_or(config.frames);

    let mut runtime = Runtime::new(&config);
    let report = runtime.load_all(&config.extensions);
    output::load_report(&report, &runtime.manager);
    report_ordering(&runtime);

    let start = Instant::now();
    let ran = drive(&mut runtime, &config, frames).await;

    print_execution(&mut runtime);
    runtime.manager.unload_all();

    output::summary(
        ran,
        report.loaded.len(),
        report.failed.len(),
        start.elapsed().as_millis() as u64,
    );

    Ok(())
}

/// Runs frames at the configured tick rate. Returns the number of frames run.
async fn drive(runtime: &mut Runtime, config: &RuntimeConfig, frames: u64) -> u64 {
    let delta = config.frame_delta();
    let mut interval = time::interval(Duration::from_secs_f64(delta));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let progress = if frames > 0 {
        output::create_progress_bar(frames, "frames")
    } else {
        output::create_spinner("Running (Ctrl-C to stop)")
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ran = 0;
    while frames == 0 || ran < frames {
        tokio::select! {
            _ = interval.tick() => {
                runtime.manager.run(delta);
                ran += 1;
                if frames > 0 {
                    progress.inc(1);
                } else {
                    progress.set_message(format!("Running frame {} (Ctrl-C to stop)", ran));
                }
            }
            _ = &mut ctrl_c => {
                tracing::debug!(frames = ran, "interrupted");
                break;
            }
        }
    }

    progress.finish_and_clear();
    ran
}

/// Warns about gaps between the configured order and the loaded systems.
pub(crate) fn report_ordering(runtime: &Runtime) {
    let scheduler = runtime.manager.scheduler();
    for id in scheduler.missing_systems() {
        output::warning(&format!("Ordered system '{}' is not registered", id));
    }
    for id in scheduler.unmapped_systems() {
        output::warning(&format!("System '{}' is not in the order, running it last", id));
    }
}

fn print_execution(runtime: &mut Runtime) {
    let order = runtime.manager.scheduler_mut().execution_order().to_vec();
    if order.is_empty() {
        output::info("No systems were scheduled");
        return;
    }

    output::section_header("Systems");
    let counts = runtime.ticks.counts();
    for id in order {
        let ticks = counts
            .iter()
            .find(|(counted, _)| *counted == id)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        let state = if runtime.manager.scheduler().is_enabled(&id) {
            ""
        } else {
            " (disabled)"
        };
        output::list_item(&format!("{}: {} ticks{}", id, ticks, state));
    }
}
