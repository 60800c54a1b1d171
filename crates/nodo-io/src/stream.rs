//! Real-time audio streaming via cpal.
//!
//! [`AudioStream::open`] moves a configured
//! [`NodeManager`](nodo_core::NodeManager) into the device callback; from
//! then on the audio thread owns the graph and the control thread talks to
//! it through the [`TaskSender`](nodo_core::TaskSender) and shared
//! [`AtomicParam`](nodo_core::AtomicParam)s. Device and format failures
//! surface synchronously from `open`, before any audio runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, Stream};

use nodo_core::{MultiSampleBuffer, NodeManager, TaskSender};

use crate::config::EngineConfig;
use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// List all available audio devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                let sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);
                let is_output = device.default_output_config().is_ok();
                devices.push(AudioDevice {
                    name,
                    is_input: true,
                    is_output,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                let sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);
                devices.push(AudioDevice {
                    name,
                    is_input: false,
                    is_output: true,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    Ok(devices)
}

/// Get the default input and output device info.
pub fn default_devices() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();

    let input = host.default_input_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: true,
            is_output: false,
            default_sample_rate: d
                .default_input_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
        })
    });

    let output = host.default_output_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: false,
            is_output: true,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
        })
    });

    Ok((input, output))
}

/// Find a device by partial name match (case-insensitive).
pub fn find_device_fuzzy(search: &str, is_input: bool) -> Result<AudioDevice> {
    let devices = list_devices()?;
    let search_lower = search.to_lowercase();

    let filtered: Vec<_> = devices
        .iter()
        .filter(|d| {
            let matches_type = if is_input { d.is_input } else { d.is_output };
            matches_type && d.name.to_lowercase().contains(&search_lower)
        })
        .collect();

    match filtered.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no {} device matching '{}'",
            if is_input { "input" } else { "output" },
            search
        ))),
        _ => Ok(filtered[0].clone()),
    }
}

/// Find a device by zero-based index among input or output devices.
pub fn find_device_by_index(index: usize, is_input: bool) -> Result<AudioDevice> {
    let devices = list_devices()?;
    let filtered: Vec<_> = devices
        .iter()
        .filter(|d| if is_input { d.is_input } else { d.is_output })
        .collect();

    filtered.get(index).cloned().cloned().ok_or_else(|| {
        Error::DeviceNotFound(format!(
            "{} device index {} (only {} devices available)",
            if is_input { "input" } else { "output" },
            index,
            filtered.len()
        ))
    })
}

/// A live audio stream driving a node graph.
///
/// The `NodeManager` lives inside the output callback; this handle is what
/// the control thread keeps. Dropping it tears the stream down.
pub struct AudioStream {
    tasks: TaskSender,
    running: Arc<AtomicBool>,
    config: EngineConfig,
    _output_stream: Stream,
    _input_stream: Option<Stream>,
}

impl AudioStream {
    /// Opens a cpal stream per `config` and moves `manager` into the device
    /// callback.
    ///
    /// The manager's sample rate, internal buffer size, and channel counts
    /// are aligned with the configuration before the stream starts. Returns
    /// an error — and starts no audio — when the configuration is invalid,
    /// a requested device is missing, or the device cannot stream 32-bit
    /// float samples.
    pub fn open(mut manager: NodeManager, config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let sample_rate = config.sample_rate as f32;
        if manager.sample_rate() != sample_rate {
            manager.set_sample_rate(sample_rate);
        }
        let internal = config.internal_buffer_size as usize;
        if manager.internal_buffer_size() != internal {
            manager.set_internal_buffer_size(internal);
        }
        manager.set_input_channel_count(config.input_channels as usize);
        manager.set_output_channel_count(config.output_channels as usize);
        let tasks = manager.task_sender();

        let host = cpal::default_host();
        let output_device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        check_f32(&output_device, false)?;

        let running = Arc::new(AtomicBool::new(true));
        let input_channels = config.input_channels as usize;
        let output_channels = config.output_channels as usize;

        let mut input_stream = None;
        let mut input_feed = None;
        if input_channels > 0 {
            let input_device = match &config.input_device {
                Some(name) => find_input_device(&host, name)?,
                None => host.default_input_device().ok_or(Error::NoDevice)?,
            };
            check_f32(&input_device, true)?;

            let stream_config = cpal::StreamConfig {
                channels: config.input_channels,
                sample_rate: config.sample_rate,
                buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
            };
            let (feed, receiver) = mpsc::sync_channel::<Vec<f32>>(4);
            let input_running = Arc::clone(&running);
            let stream = input_device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if input_running.load(Ordering::SeqCst) {
                            let _ = feed.try_send(data.to_vec());
                        }
                    },
                    |err| tracing::error!("input stream error: {err}"),
                    None,
                )
                .map_err(|e| Error::Stream(e.to_string()))?;
            tracing::info!(
                "input stream opened: {} channel(s)",
                config.input_channels
            );
            input_stream = Some(stream);
            input_feed = Some(receiver);
        }

        let stream_config = cpal::StreamConfig {
            channels: config.output_channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };
        let output_running = Arc::clone(&running);
        let mut scratch_in = MultiSampleBuffer::new(input_channels, 0);
        let mut scratch_out = MultiSampleBuffer::new(output_channels, 0);
        let mut pending: Vec<f32> = Vec::new();

        let output_stream = output_device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !output_running.load(Ordering::SeqCst) {
                        data.fill(0.0);
                        return;
                    }
                    let frames = data.len() / output_channels;
                    if scratch_out.frame_count() != frames {
                        scratch_out.resize(output_channels, frames);
                    }

                    if let Some(receiver) = &input_feed {
                        while let Ok(chunk) = receiver.try_recv() {
                            pending.extend(chunk);
                        }
                        if scratch_in.frame_count() != frames {
                            scratch_in.resize(input_channels, frames);
                        }
                        let needed = frames * input_channels;
                        if pending.len() >= needed {
                            deinterleave_into(&pending[..needed], &mut scratch_in);
                            pending.drain(..needed);
                        } else {
                            scratch_in.clear();
                        }
                    }

                    manager.process(&scratch_in, &mut scratch_out, frames);
                    interleave_into(&scratch_out, data);
                },
                |err| tracing::error!("output stream error: {err}"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        if let Some(stream) = &input_stream {
            stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        }
        tracing::info!(
            "output stream started: {} channel(s), {} Hz, buffer {} (internal {})",
            config.output_channels,
            config.sample_rate,
            config.buffer_size,
            config.internal_buffer_size
        );

        Ok(Self {
            tasks,
            running,
            config: config.clone(),
            _output_stream: output_stream,
            _input_stream: input_stream,
        })
    }

    /// Returns a handle for enqueueing graph mutations onto the audio
    /// thread.
    pub fn tasks(&self) -> TaskSender {
        self.tasks.clone()
    }

    /// The configuration this stream was opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Silences the stream; the callback keeps firing but outputs zeros.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Returns true while the stream is producing graph output.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Verifies the device's default config uses 32-bit float samples.
fn check_f32(device: &Device, is_input: bool) -> Result<()> {
    let format = if is_input {
        device
            .default_input_config()
            .map(|c| c.sample_format())
            .map_err(|e| Error::Stream(e.to_string()))?
    } else {
        device
            .default_output_config()
            .map(|c| c.sample_format())
            .map_err(|e| Error::Stream(e.to_string()))?
    };
    if format != SampleFormat::F32 {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }
    Ok(())
}

/// Splits interleaved samples into the channels of `output`.
fn deinterleave_into(interleaved: &[f32], output: &mut MultiSampleBuffer) {
    let channels = output.channel_count();
    if channels == 0 {
        return;
    }
    for channel_index in 0..channels {
        if let Some(channel) = output.channel_mut(channel_index) {
            for (frame, samples) in interleaved.chunks_exact(channels).enumerate() {
                channel[frame] = samples[channel_index];
            }
        }
    }
}

/// Interleaves the channels of `buffer` into `data`.
fn interleave_into(buffer: &MultiSampleBuffer, data: &mut [f32]) {
    let channels = buffer.channel_count();
    if channels == 0 {
        data.fill(0.0);
        return;
    }
    for (frame, out) in data.chunks_exact_mut(channels).enumerate() {
        for (channel_index, sample) in out.iter_mut().enumerate() {
            *sample = buffer.channel(channel_index).map_or(0.0, |c| c[frame]);
        }
    }
}

/// Find an input device by exact name, partial name, or index.
fn find_input_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    find_device_from_list(&devices, name_or_index, "input")
}

/// Find an output device by exact name, partial name, or index.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    find_device_from_list(&devices, name_or_index, "output")
}

/// Find a device from a list by index, exact name, or fuzzy match.
fn find_device_from_list(devices: &[Device], name_or_index: &str, kind: &str) -> Result<Device> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "{} device index {} (only {} devices available)",
                kind,
                index,
                devices.len()
            ))
        });
    }

    for device in devices {
        if device_name(device).is_ok_and(|n| n == name_or_index) {
            return Ok(device.clone());
        }
    }

    let search_lower = name_or_index.to_lowercase();
    let mut matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d).ok().and_then(|name| {
                if name.to_lowercase().contains(&search_lower) {
                    Some((d.clone(), name))
                } else {
                    None
                }
            })
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no {} device matching '{}'",
            kind, name_or_index
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                "'{}' matches multiple {} devices: {:?}; using {}",
                name_or_index,
                kind,
                names,
                names[0]
            );
            Ok(matches.remove(0).0)
        }
    }
}
