//! Subcommand implementations.

pub mod batch;
pub mod chat;
pub mod config;
pub mod run;

use std::path::Path;

use scatterpilot_core::ScatterConfig;

/// Load the `--config` file if given, else the default config file if it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ScatterConfig> {
    if let Some(path) = config_path {
        return Ok(ScatterConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(ScatterConfig::from_file(&default_path)?)
    } else {
        Ok(ScatterConfig::default())
    }
}
