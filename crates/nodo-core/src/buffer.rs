//! Sample containers for block-based processing.
//!
//! A [`SampleBuffer`] holds one internal block of mono samples; every output
//! pin in the graph owns exactly one, sized to the manager's internal buffer
//! size. A [`MultiSampleBuffer`] holds one `SampleBuffer` per channel and is
//! used both for statically loaded audio (decoded files) and for the planar
//! hardware buffers exchanged with the device callback.

use std::ops::{Deref, DerefMut};

/// A single channel of consecutive audio samples.
///
/// Length is fixed between resizes; samples are mutated in place. Derefs to
/// `[f32]` for slice access.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Creates a zeroed buffer of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Resizes to `len` samples, zero-filling any new samples.
    pub fn resize(&mut self, len: usize) {
        self.samples.resize(len, 0.0);
    }

    /// Fills the buffer with zeros.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Returns the samples as an immutable slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the samples as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}

impl Deref for SampleBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.samples
    }
}

impl DerefMut for SampleBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}

impl From<Vec<f32>> for SampleBuffer {
    fn from(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

/// Multi-channel planar audio: one [`SampleBuffer`] per channel, all of
/// equal length.
#[derive(Debug, Clone, Default)]
pub struct MultiSampleBuffer {
    channels: Vec<SampleBuffer>,
}

impl MultiSampleBuffer {
    /// Creates `channels` zeroed buffers of `frames` samples each.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| SampleBuffer::new(frames)).collect(),
        }
    }

    /// Builds a multi-channel buffer from already-deinterleaved channel data.
    ///
    /// All channels must have equal length; shorter channels are zero-padded
    /// to the longest.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        let mut channels: Vec<SampleBuffer> =
            channels.into_iter().map(SampleBuffer::from).collect();
        for channel in &mut channels {
            channel.resize(frames);
        }
        Self { channels }
    }

    /// Replaces all channel buffers with `channels` buffers of `frames`
    /// samples each, preserving existing content where it fits.
    pub fn resize(&mut self, channels: usize, frames: usize) {
        self.channels
            .resize_with(channels, || SampleBuffer::new(frames));
        for channel in &mut self.channels {
            channel.resize(frames);
        }
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, |c| c.len())
    }

    /// Returns true if there are no channels or no frames.
    pub fn is_empty(&self) -> bool {
        self.channel_count() == 0 || self.frame_count() == 0
    }

    /// Returns the buffer for `channel`, or `None` if out of range.
    #[inline]
    pub fn channel(&self, channel: usize) -> Option<&SampleBuffer> {
        self.channels.get(channel)
    }

    /// Returns the mutable buffer for `channel`, or `None` if out of range.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut SampleBuffer> {
        self.channels.get_mut(channel)
    }

    /// Iterates over all channel buffers.
    pub fn channels(&self) -> impl Iterator<Item = &SampleBuffer> {
        self.channels.iter()
    }

    /// Iterates mutably over all channel buffers.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut SampleBuffer> {
        self.channels.iter_mut()
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_buffer_resize_zero_fills() {
        let mut buf = SampleBuffer::new(4);
        buf.as_mut_slice().fill(1.0);
        buf.resize(8);
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[..4], &[1.0; 4]);
        assert_eq!(&buf[4..], &[0.0; 4]);
    }

    #[test]
    fn multi_buffer_equal_channel_lengths() {
        let multi = MultiSampleBuffer::from_channels(vec![vec![1.0; 3], vec![2.0; 5]]);
        assert_eq!(multi.channel_count(), 2);
        assert_eq!(multi.frame_count(), 5);
        assert_eq!(multi.channel(0).unwrap().len(), 5);
        assert_eq!(multi.channel(0).unwrap()[3], 0.0);
    }

    #[test]
    fn multi_buffer_resize_replaces_all_channels() {
        let mut multi = MultiSampleBuffer::new(2, 64);
        multi.resize(4, 128);
        assert_eq!(multi.channel_count(), 4);
        for channel in multi.channels() {
            assert_eq!(channel.len(), 128);
        }
    }
}
