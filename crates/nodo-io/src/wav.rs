//! WAV file reading and writing.
//!
//! Files are loaded deinterleaved, one [`SampleBuffer`](nodo_core::SampleBuffer)
//! per channel, ready for [`BufferPlayerNode`](nodo_core::nodes::BufferPlayerNode)s.
//! The graph itself never parses audio formats.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use nodo_core::MultiSampleBuffer;

use crate::Result;

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Reads WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels);
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Reads a WAV file into a deinterleaved [`MultiSampleBuffer`].
///
/// Integer formats are normalized to f32 in `[-1, 1]`. Returns the buffer
/// and the file's sample rate; the caller is responsible for matching the
/// engine's rate (no resampling happens here).
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(MultiSampleBuffer, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = samples.len() / channel_count;
    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(frames))
        .collect();
    for frame in samples.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame.iter()) {
            channel.push(sample);
        }
    }

    Ok((MultiSampleBuffer::from_channels(channels), spec.sample_rate))
}

/// Writes a [`MultiSampleBuffer`] to a 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    buffer: &MultiSampleBuffer,
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for frame in 0..buffer.frame_count() {
        for channel in buffer.channels() {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}
