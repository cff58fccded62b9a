use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "routeprobe.json";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeProfileConfig {
    pub base_url: Option<String>,
    pub default_headers: Option<HashMap<String, String>>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeConfig {
    pub profiles: HashMap<String, ProbeProfileConfig>,
    pub default_profile: Option<String>,
    pub base_url: Option<String>,
    pub default_headers: Option<HashMap<String, String>>,
    pub timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ProbeConfig,
    /// The file the configuration was read from.
    pub path: PathBuf,
}

/// Reads `routeprobe.json` from a directory, or `target` itself when it
/// names a file. A missing file yields `None`.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let path = if target.is_dir() {
        target.join(CONFIG_FILE_NAME)
    } else {
        target.to_path_buf()
    };

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()))
        }
    };

    let config: ProbeConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(
        path = %path.display(),
        profiles = config.profiles.len(),
        "loaded config"
    );

    Ok(Some(LoadedConfig { config, path }))
}
