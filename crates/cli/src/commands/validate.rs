//! Validate command implementation.

use std::collections::HashSet;
use std::path::Path;

use miette::{Result, miette};
use tessera_engine::RuntimeConfig;

use crate::catalog;
use crate::output;
use crate::runtime::Runtime;

/// Problems found in a config.
#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Validates tessera.json and trial-loads its extensions.
pub fn execute(config_path: &Path) -> Result<()> {
    output::info(&format!("Validating {}...", config_path.display()));

    let config = match RuntimeConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            output::error(&format!("Config error: {}", e));
            return Err(miette!("Validation failed: {}", e));
        }
    };

    let findings = check(&config);

    for warning in &findings.warnings {
        output::warning(warning);
    }
    for error in &findings.errors {
        output::error(error);
    }

    if !findings.errors.is_empty() {
        return Err(miette!(
            "Validation failed: {} error(s)",
            findings.errors.len()
        ));
    }

    output::success(&format!(
        "Config is valid ({} extensions, {} ordered systems)",
        config.extensions.len(),
        config.systems.order.len()
    ));

    Ok(())
}

fn check(config: &RuntimeConfig) -> Findings {
    let mut findings = Findings::default();

    for id in config.duplicate_systems() {
        findings
            .warnings
            .push(format!("System '{}' appears more than once in the order", id));
    }

    // Trial load each known extension once to surface registration failures
    let mut seen = HashSet::new();
    let mut trial = Vec::new();
    for id in &config.extensions {
        if !seen.insert(id.as_str()) {
            findings
                .warnings
                .push(format!("Extension '{}' is listed more than once", id));
        } else if catalog::find(id).is_none() {
            findings.errors.push(format!("Unknown extension '{}'", id));
        } else {
            trial.push(id.clone());
        }
    }

    let mut runtime = Runtime::new(config);
    let report = runtime.load_all(&trial);
    for (id, failure) in &report.failed {
        findings
            .errors
            .push(format!("Extension '{}' failed to load: {}", id, failure));
    }

    let scheduler = runtime.manager.scheduler();
    for id in scheduler.missing_systems() {
        findings
            .warnings
            .push(format!("Ordered system '{}' is not registered by any extension", id));
    }
    for id in scheduler.unmapped_systems() {
        findings
            .warnings
            .push(format!("System '{}' is not in the order and will run last", id));
    }

    runtime.manager.unload_all();
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: &str) -> RuntimeConfig {
        RuntimeConfig::from_json(json).unwrap()
    }

    #[test]
    fn test_clean_config() {
        let findings = check(&config(
            r#"{ "systems": { "order": ["input"] }, "extensions": ["core.input"] }"#,
        ));
        assert!(findings.errors.is_empty());
        assert!(findings.warnings.is_empty());
    }

    #[test]
    fn test_unknown_and_failing_extensions_are_errors() {
        let findings = check(&config(
            r#"{ "extensions": ["core.weather", "demo.unstable"] }"#,
        ));
        assert_eq!(findings.errors.len(), 2);
        assert!(findings.errors[0].contains("core.weather"));
        assert!(findings.errors[1].contains("blink.pak"));
    }

    #[test]
    fn test_ordering_gaps_are_warnings() {
        let findings = check(&config(
            r#"{
                "systems": { "order": ["input", "input", "physics"] },
                "extensions": ["core.input", "core.loot", "core.input"]
            }"#,
        ));
        assert!(findings.errors.is_empty());
        assert_eq!(
            findings.warnings,
            vec![
                "System 'input' appears more than once in the order",
                "Extension 'core.input' is listed more than once",
                "Ordered system 'physics' is not registered by any extension",
                "System 'loot' is not in the order and will run last",
            ]
        );
    }
}
