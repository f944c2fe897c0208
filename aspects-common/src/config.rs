//! Configuration file resolution and loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "ASPECTS_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "aspects";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory (`~/.config/aspects/config.toml` on Linux)
///
/// Returns `None` when no source names an existing file; callers then fall
/// back to built-in defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    default_config_path().filter(|path| path.exists())
}

/// Platform-dependent default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Load and deserialize a TOML file
///
/// A missing file is reported as [`Error::NotFound`], a malformed one as
/// [`Error::Config`].
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Loaded configuration file");
    Ok(parsed)
}

/// Load configuration from the resolved path, or `T::default()` when none exists
pub fn load_or_default<T>(cli_arg: Option<&Path>, env_var_name: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match resolve_config_path(cli_arg, env_var_name) {
        Some(path) => load_toml(&path),
        None => {
            tracing::debug!("No configuration file found, using built-in defaults");
            Ok(T::default())
        }
    }
}
