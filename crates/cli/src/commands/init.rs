//! Init command implementation.

use std::fs;
use std::path::Path;

use miette::{Result, miette};

use crate::discovery::CONFIG_NAME;
use crate::output;

const TEMPLATE: &str = r#"{
  "tick_rate": 60,
  "frames": 300,
  "systems": {
    "order": ["input", "movement", "combat_ai", "combat", "loot"],
    "disabled": []
  },
  "extensions": ["core.input", "core.movement", "core.combat", "core.loot"]
}
"#;

/// Initializes a new tessera.json in the current directory.
pub fn execute(force: bool) -> Result<()> {
    write_template(Path::new(CONFIG_NAME), force)?;

    output::success(&format!("Created {}", CONFIG_NAME));
    output::info("Run 'tessera list' to see the built-in extensions");

    Ok(())
}

fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(miette!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }

    fs::write(path, TEMPLATE).map_err(|e| miette!("Failed to write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use tessera_engine::RuntimeConfig;

    #[test]
    fn test_template_is_a_valid_config() {
        let config = RuntimeConfig::from_json(TEMPLATE).unwrap();
        assert_eq!(config.tick_rate, 60);
        assert!(config.duplicate_systems().is_empty());
    }

    #[test]
    fn test_template_loads_cleanly() {
        let config = RuntimeConfig::from_json(TEMPLATE).unwrap();
        let mut runtime = Runtime::new(&config);

        let report = runtime.load_all(&config.extensions);

        assert!(report.failed.is_empty());
        assert!(runtime.manager.scheduler().missing_systems().is_empty());
        assert!(runtime.manager.scheduler().unmapped_systems().is_empty());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_NAME);
        fs::write(&path, "{}").unwrap();

        assert!(write_template(&path, false).is_err());
        write_template(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), TEMPLATE);
    }
}
