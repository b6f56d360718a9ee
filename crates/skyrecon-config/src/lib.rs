//! skyrecon configuration
//!
//! Finds and loads the YAML file that tells the CLI which provider driver to
//! run and how long to wait for resources to settle.

pub mod error;
pub mod model;

pub use error::*;
pub use model::*;

use std::path::{Path, PathBuf};

/// Environment variable naming a config file directly
pub const CONFIG_PATH_ENV: &str = "SKYRECON_CONFIG_PATH";

const CANDIDATES: [&str; 3] = ["skyrecon.local.yaml", "skyrecon.yaml", ".skyrecon.yaml"];

/// skyrecon's directory under the user config dir
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("skyrecon");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the config file.
///
/// Search order:
/// 1. `SKYRECON_CONFIG_PATH`
/// 2. current directory: skyrecon.local.yaml, skyrecon.yaml, .skyrecon.yaml
/// 3. `./.skyrecon/`, same names
/// 4. `~/.config/skyrecon/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to missing file {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".skyrecon");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("skyrecon").join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Read and validate one config file
pub fn load_from(path: &Path) -> Result<ReconConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = ReconConfig::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Load the discovered config file, or defaults when there is none
pub fn load() -> Result<ReconConfig> {
    match find_config_file() {
        Ok(path) => load_from(&path),
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("no config file found, using defaults");
            Ok(ReconConfig::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, f);
        std::env::set_current_dir(original_dir).unwrap();
        result
    }

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("skyrecon"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("skyrecon.yaml"), "# test").unwrap();

        let found = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(found.ends_with("skyrecon.yaml"));
    }

    #[test]
    #[serial]
    fn test_local_file_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("skyrecon.yaml"), "# shared").unwrap();
        fs::write(temp_dir.path().join(".skyrecon.yaml"), "# hidden").unwrap();
        fs::write(temp_dir.path().join("skyrecon.local.yaml"), "# local").unwrap();

        let found = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(found.ends_with("skyrecon.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".skyrecon");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("skyrecon.yaml"), "# in project dir").unwrap();

        let found = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(found.ends_with(".skyrecon/skyrecon.yaml"));
    }

    #[test]
    #[serial]
    fn test_env_var_wins_over_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("skyrecon.yaml"), "# cwd").unwrap();
        let custom = temp_dir.path().join("custom.yaml");
        fs::write(&custom, "# custom").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        let found = temp_env::with_var(CONFIG_PATH_ENV, Some(custom.as_os_str()), find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert_eq!(found.unwrap(), custom);
    }

    #[test]
    #[serial]
    fn test_missing_env_path_falls_through() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".skyrecon.yaml"), "# hidden").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        let found = temp_env::with_var(
            CONFIG_PATH_ENV,
            Some(temp_dir.path().join("nope.yaml").as_os_str()),
            find_config_file,
        );
        std::env::set_current_dir(original_dir).unwrap();

        assert!(found.unwrap().ends_with(".skyrecon.yaml"));
    }

    #[test]
    #[serial]
    fn test_load_without_file_gives_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();

        // keep a real global config out of the way
        let config = temp_env::with_vars(
            [
                ("HOME", Some(home.path().as_os_str())),
                ("XDG_CONFIG_HOME", Some(home.path().as_os_str())),
            ],
            || in_dir(temp_dir.path(), load),
        )
        .unwrap();
        assert_eq!(config, ReconConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_reports_parse_errors_with_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("skyrecon.yaml");
        fs::write(&path, "provider: [not, a, map]\n").unwrap();

        match in_dir(temp_dir.path(), load) {
            Err(ConfigError::Parse { path: reported, .. }) => {
                assert!(reported.ends_with("skyrecon.yaml"))
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_validates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("skyrecon.yaml");

        fs::write(&path, "provider:\n  region: eu-west-1\nfanout:\n  concurrency: 2\n").unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.provider.region, "eu-west-1");
        assert_eq!(config.fanout.concurrency, 2);

        fs::write(&path, "provider:\n  name: azure\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Invalid(_))));
    }
}
