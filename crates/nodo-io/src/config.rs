//! Engine configuration surface.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Stream and engine configuration, loadable from TOML.
///
/// Everything here is settable before the stream starts; at runtime the
/// graph parameters are only re-settable through the task queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Device callback buffer size in frames.
    pub buffer_size: u32,
    /// Internal block size of the node graph, in frames. Must divide
    /// `buffer_size` evenly.
    pub internal_buffer_size: u32,
    /// Number of hardware input channels (0 disables the input stream).
    pub input_channels: u16,
    /// Number of hardware output channels.
    pub output_channels: u16,
    /// Input device: index, exact name, or partial name. Default device if
    /// unset.
    pub input_device: Option<String>,
    /// Output device: index, exact name, or partial name. Default device if
    /// unset.
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            internal_buffer_size: 64,
            input_channels: 0,
            output_channels: 2,
            input_device: None,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for internal consistency.
    ///
    /// The internal buffer size must fit a whole number of times into the
    /// device buffer size; the block scheduler depends on it.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be > 0".into()));
        }
        if self.internal_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "internal buffer size must be > 0".into(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("buffer size must be > 0".into()));
        }
        if self.buffer_size % self.internal_buffer_size != 0 {
            return Err(Error::InvalidConfig(format!(
                "internal buffer size {} does not fit device buffer size {}",
                self.internal_buffer_size, self.buffer_size
            )));
        }
        if self.output_channels == 0 && self.input_channels == 0 {
            return Err(Error::InvalidConfig(
                "cannot start a stream with zero input and output channels".into(),
            ));
        }
        Ok(())
    }
}
