//! CLI subcommands.

pub mod devices;
pub mod play;
pub mod render;
pub mod sine;

use std::path::Path;

use nodo_io::EngineConfig;

/// Loads an [`EngineConfig`] from a TOML file, or the defaults when no file
/// is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_toml_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}
