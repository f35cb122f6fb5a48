//! Config discovery logic.

use std::path::{Path, PathBuf};

use miette::{Result, miette};

/// Default config file name.
pub const CONFIG_NAME: &str = "tessera.json";

/// Finds tessera.json by searching from the current directory upwards.
pub fn find_config() -> Result<PathBuf> {
    find_config_from(
        &std::env::current_dir().map_err(|e| miette!("Cannot get current directory: {}", e))?,
    )
}

/// Finds tessera.json starting from the given directory.
pub fn find_config_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config = current.join(CONFIG_NAME);

        if config.is_file() {
            return Ok(config);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => {
                return Err(miette!(
                    "{} not found in {} or any parent directory. Run 'tessera init' to create one.",
                    CONFIG_NAME,
                    start.display()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_config_in_current() {
        let dir = tempdir().unwrap();
        let config = dir.path().join(CONFIG_NAME);
        fs::write(&config, "{}").unwrap();

        let result = find_config_from(dir.path()).unwrap();
        assert_eq!(result, config);
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempdir().unwrap();
        let config = dir.path().join(CONFIG_NAME);
        fs::write(&config, "{}").unwrap();

        let subdir = dir.path().join("mods").join("combat");
        fs::create_dir_all(&subdir).unwrap();

        let result = find_config_from(&subdir).unwrap();
        assert_eq!(result, config);
    }

    #[test]
    fn test_directory_named_like_config_is_skipped() {
        let dir = tempdir().unwrap();
        let config = dir.path().join(CONFIG_NAME);
        fs::write(&config, "{}").unwrap();

        let subdir = dir.path().join("nested");
        fs::create_dir_all(subdir.join(CONFIG_NAME)).unwrap();

        let result = find_config_from(&subdir).unwrap();
        assert_eq!(result, config);
    }

    #[test]
    fn test_find_config_not_found() {
        let result = find_config_from(Path::new("/"));
        assert!(result.is_err());
    }
}
