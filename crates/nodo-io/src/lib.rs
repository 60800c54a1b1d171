//! Device and file I/O for the nodo audio engine.
//!
//! This crate provides the collaborators the core graph treats as external:
//!
//! - **Streaming**: [`AudioStream`] opens a cpal stream and invokes
//!   [`NodeManager::process`](nodo_core::NodeManager::process) from the
//!   device callback
//! - **WAV file I/O**: [`read_wav`] loads decoded, deinterleaved audio into
//!   a [`MultiSampleBuffer`](nodo_core::MultiSampleBuffer); [`write_wav`]
//!   stores rendered output
//! - **Configuration**: [`EngineConfig`] — the serde/toml surface for
//!   sample rate, buffer sizes, channel counts, and device selection
//! - **Offline rendering**: [`render`] drives the graph without a device
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nodo_core::{NodeManager, InputRef, OutputRef};
//! use nodo_core::nodes::{OutputNode, SineNode};
//! use nodo_io::{AudioStream, EngineConfig};
//!
//! let config = EngineConfig::default();
//! let mut manager = NodeManager::new(
//!     config.sample_rate as f32,
//!     config.internal_buffer_size as usize,
//!     0,
//!     config.output_channels as usize,
//! );
//! let osc = manager.add_node(Box::new(SineNode::new(440.0)));
//! let speaker = manager.add_root_node(Box::new(OutputNode::new(0)));
//! manager.connect(OutputRef::new(osc, 0), InputRef::new(speaker, 0));
//!
//! let stream = AudioStream::open(manager, &config)?;
//! // ... the graph now runs on the audio thread; mutate it via
//! // stream.tasks().enqueue(...)
//! stream.stop();
//! ```

mod config;
mod render;
mod stream;
mod wav;

pub use config::EngineConfig;
pub use render::render;
pub use stream::{
    AudioDevice, AudioStream, default_devices, find_device_by_index, find_device_fuzzy,
    list_devices,
};
pub use wav::{read_wav, read_wav_info, write_wav, WavInfo};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device does not provide 32-bit float samples.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The engine configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file parse error.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
