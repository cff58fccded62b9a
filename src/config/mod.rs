mod loader;
mod settings;

pub use loader::{load_config, LoadedConfig, ProbeConfig, ProbeProfileConfig, CONFIG_FILE_NAME};
pub use settings::{ProbeSettings, SettingsBuilder};
