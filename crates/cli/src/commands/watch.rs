//! Watch command implementation.
//!
//! Drives frames like `run` and hot-reloads extensions when tessera.json
//! changes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use miette::{Result, miette};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tessera_engine::RuntimeConfig;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::commands::run::report_ordering;
use crate::output;
use crate::runtime::Runtime;

/// Quiet period before a change is applied (debounce).
const DEBOUNCE_MS: u64 = 300;

/// What a config change requires.
#[derive(Debug, PartialEq, Eq)]
enum Reload {
    /// Nothing relevant changed.
    Unchanged,

    /// Scheduler order or disabled set changed; start a fresh runtime.
    Rebuild,

    /// Unload and load individual extensions.
    Patch {
        unload: Vec<String>,
        load: Vec<String>,
    },
}

/// Decides how to move from `loaded` (in load order) to the new config.
///
/// Extensions that are configured but not loaded, including ones that
/// failed last time, are loaded again.
fn plan_reload(old: &RuntimeConfig, new: &RuntimeConfig, loaded: &[String]) -> Reload {
    if old.systems != new.systems {
        return Reload::Rebuild;
    }

    let unload: Vec<String> = loaded
        .iter()
        .rev()
        .filter(|id| !new.extensions.contains(id))
        .cloned()
        .collect();

    let mut load: Vec<String> = Vec::new();
    for id in &new.extensions {
        if !loaded.contains(id) && !load.contains(id) {
            load.push(id.clone());
        }
    }

    if unload.is_empty() && load.is_empty() {
        Reload::Unchanged
    } else {
        Reload::Patch { unload, load }
    }
}

fn frame_interval(config: &RuntimeConfig) -> Interval {
    let mut interval = time::interval(Duration::from_secs_f64(config.frame_delta()));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Executes watch mode.
pub async fn execute(config_path: &Path, clear_screen: bool) -> Result<()> {
    let mut config = RuntimeConfig::from_file(config_path)
        .map_err(|e| miette!("Failed to load {}: {}", config_path.display(), e))?;

    let mut runtime = Runtime::new(&config);
    let report = runtime.load_all(&config.extensions);
    output::load_report(&report, &runtime.manager);
    report_ordering(&runtime);

    // Watch the directory so editors that replace the file are still seen
    let watch_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name: Option<OsString> = config_path.file_name().map(|n| n.to_os_string());

    let (tx, mut rx) = mpsc::channel::<PathBuf>(100);
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    if path.file_name().map(|n| n.to_os_string()) == file_name {
                        let _ = tx.blocking_send(path);
                    }
                }
            }
        },
        Config::default().with_poll_interval(Duration::from_millis(200)),
    )
    .map_err(|e| miette!("Failed to create file watcher: {}", e))?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .map_err(|e| miette!("Failed to watch {}: {}", watch_dir.display(), e))?;

    println!(
        "\n{} Watching {} for changes (Ctrl-C to stop)...\n",
        style("👁").cyan(),
        style(config_path.display()).cyan().bold()
    );

    let spinner = output::create_spinner("Running...");
    let mut interval = frame_interval(&config);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                runtime.manager.run(config.frame_delta());
                spinner.set_message(format!(
                    "Frame {} with {} extensions",
                    runtime.manager.scheduler().frame(),
                    runtime.manager.count()
                ));
            }
            Some(changed) = rx.recv() => {
                // Let a burst of writes settle, then drain it
                time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
                while rx.try_recv().is_ok() {}

                spinner.suspend(|| {
                    if clear_screen {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    println!(
                        "\n{} Config changed: {}\n",
                        style("↻").yellow().bold(),
                        style(changed.display()).yellow()
                    );
                });

                let new = match RuntimeConfig::from_file(config_path) {
                    Ok(new) => new,
                    Err(e) => {
                        let message = format!("Keeping previous config: {}", e);
                        spinner.suspend(|| output::error(&message));
                        continue;
                    }
                };

                let plan = plan_reload(&config, &new, &runtime.manager.loaded_ids());
                spinner.suspend(|| match plan {
                    Reload::Unchanged => output::info("No extension changes"),
                    Reload::Rebuild => {
                        output::info("System order changed, rebuilding runtime");
                        runtime.manager.unload_all();
                        runtime = Runtime::new(&new);
                        let report = runtime.load_all(&new.extensions);
                        output::load_report(&report, &runtime.manager);
                        report_ordering(&runtime);
                    }
                    Reload::Patch { unload, load } => {
                        for id in &unload {
                            if runtime.manager.unload(id).is_ok() {
                                output::extension_unloaded(id);
                            }
                        }
                        let report = runtime.load_all(&load);
                        output::load_report(&report, &runtime.manager);
                        report_ordering(&runtime);
                    }
                });

                if new.tick_rate != config.tick_rate {
                    interval = frame_interval(&new);
                }
                config = new;
            }
            _ = &mut ctrl_c => break,
        }
    }

    spinner.finish_and_clear();
    runtime.manager.unload_all();
    output::success("Unloaded all extensions");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(order: &[&str], extensions: &[&str]) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.systems.order = order.iter().map(|s| s.to_string()).collect();
        config.extensions = extensions.iter().map(|s| s.to_string()).collect();
        config
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unchanged() {
        let old = config(&["input"], &["core.input"]);
        let mut new = old.clone();
        new.frames = 900;

        assert_eq!(plan_reload(&old, &new, &ids(&["core.input"])), Reload::Unchanged);
    }

    #[test]
    fn test_patch_unloads_removed_in_reverse_and_loads_added() {
        let old = config(&[], &["core.input", "core.movement", "core.combat"]);
        let new = config(&[], &["core.movement", "core.loot", "core.loot"]);
        let loaded = ids(&["core.input", "core.movement", "core.combat"]);

        assert_eq!(
            plan_reload(&old, &new, &loaded),
            Reload::Patch {
                unload: ids(&["core.combat", "core.input"]),
                load: ids(&["core.loot"]),
            }
        );
    }

    #[test]
    fn test_failed_extension_is_retried() {
        let old = config(&[], &["core.input", "core.combat"]);
        let new = old.clone();

        assert_eq!(
            plan_reload(&old, &new, &ids(&["core.input"])),
            Reload::Patch {
                unload: Vec::new(),
                load: ids(&["core.combat"]),
            }
        );
    }

    #[test]
    fn test_order_change_rebuilds() {
        let old = config(&["input", "movement"], &["core.input"]);
        let new = config(&["movement", "input"], &["core.input"]);

        assert_eq!(plan_reload(&old, &new, &ids(&["core.input"])), Reload::Rebuild);
    }

    #[test]
    fn test_tick_rate_change_keeps_extensions() {
        let old = config(&["input"], &["core.input"]);
        let mut new = old.clone();
        new.tick_rate = 30;

        assert_eq!(plan_reload(&old, &new, &ids(&["core.input"])), Reload::Unchanged);
    }

    #[tokio::test]
    async fn test_frame_interval_at_max_tick_rate() {
        let config = RuntimeConfig::from_json(r#"{ "tick_rate": 1000 }"#).unwrap();

        let interval = frame_interval(&config);

        assert_eq!(interval.period(), Duration::from_millis(1));
    }
}
