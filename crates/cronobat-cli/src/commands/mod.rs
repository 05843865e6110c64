pub mod clock;
pub mod config;
pub mod session;

use std::path::Path;

use cronobat_core::Config;

/// Explicit `--config` file, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
