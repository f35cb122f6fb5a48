//! List command implementation.

use std::path::Path;

use console::style;
use miette::{Result, miette};
use tessera_core::CapabilityKind;
use tessera_engine::RuntimeConfig;

use crate::catalog::{CATALOG, CatalogEntry};
use crate::output;
use crate::runtime::Runtime;

/// Lists the built-in extensions.
pub fn execute(config_path: &Path, detailed: bool) -> Result<()> {
    let config = RuntimeConfig::from_file(config_path)
        .map_err(|e| miette!("Failed to load {}: {}", config_path.display(), e))?;

    println!("{}", style("Built-in extensions:").bold());
    println!();

    for entry in CATALOG {
        let enabled = config.extensions.iter().any(|id| id == entry.id);

        print!("  {}", style(entry.id).cyan().bold());
        if enabled {
            print!(" {}", style("(enabled)").yellow());
        }
        println!(" - {}", style(entry.description).dim());

        if detailed {
            describe(entry);
            println!();
        }
    }

    Ok(())
}

/// Trial-loads an extension on its own and prints what it registers.
fn describe(entry: &CatalogEntry) {
    let mut runtime = Runtime::new(&RuntimeConfig::default());

    if let Err(failure) = runtime.load(entry.id) {
        output::key_value("status", &style(failure.to_string()).red().to_string());
        return;
    }

    let Some(loaded) = runtime.manager.loaded(entry.id) else {
        return;
    };

    if let Some(version) = &loaded.version {
        output::key_value("version", version);
    }
    for kind in CapabilityKind::ALL {
        let ids = loaded.added.capabilities(kind);
        if !ids.is_empty() {
            output::key_value(heading(kind), &ids.join(", "));
        }
    }
    if !loaded.added.systems.is_empty() {
        output::key_value("systems", &loaded.added.systems.join(", "));
    }
    output::key_value("listeners", &loaded.subscriptions.to_string());

    runtime.manager.unload_all();
}

fn heading(kind: CapabilityKind) -> &'static str {
    match kind {
        CapabilityKind::Ability => "abilities",
        CapabilityKind::ContentType => "content types",
        CapabilityKind::BehaviorFactory => "behavior factories",
    }
}
