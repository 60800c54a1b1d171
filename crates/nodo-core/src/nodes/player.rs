//! Playback of statically loaded audio.

use std::sync::Arc;

use crate::buffer::MultiSampleBuffer;
use crate::node::{Node, ProcessContext};

/// Plays one channel of a shared [`MultiSampleBuffer`], 0 in / 1 out.
///
/// The buffer typically comes from a file-reading collaborator; the graph
/// never parses audio formats itself. One player is created per channel so
/// multi-channel material fans out to one player per output. After the last
/// frame the node emits silence, or wraps around when looping.
pub struct BufferPlayerNode {
    buffer: Arc<MultiSampleBuffer>,
    channel: usize,
    position: usize,
    looping: bool,
}

impl BufferPlayerNode {
    /// Creates a player over `channel` of `buffer`.
    pub fn new(buffer: Arc<MultiSampleBuffer>, channel: usize, looping: bool) -> Self {
        Self {
            buffer,
            channel,
            position: 0,
            looping,
        }
    }

    /// Current playback position in frames.
    pub fn position(&self) -> usize {
        self.position
    }

    /// True once a non-looping player has consumed the whole buffer.
    pub fn is_finished(&self) -> bool {
        !self.looping && self.position >= self.buffer.frame_count()
    }

    /// Rewinds playback to the first frame.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Node for BufferPlayerNode {
    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let frames = self.buffer.frame_count();
        let Some(samples) = self.buffer.channel(self.channel) else {
            ctx.output(0).fill(0.0);
            return;
        };

        let out = ctx.output(0);
        let mut written = 0;
        while written < out.len() {
            if self.position >= frames {
                if self.looping && frames > 0 {
                    self.position = 0;
                } else {
                    out[written..].fill(0.0);
                    self.position = frames;
                    break;
                }
            }
            let run = (out.len() - written).min(frames - self.position);
            out[written..written + run]
                .copy_from_slice(&samples[self.position..self.position + run]);
            self.position += run;
            written += run;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::NodeManager;
    use crate::nodes::OutputNode;
    use crate::pin::{InputRef, OutputRef};

    fn ramp_buffer(frames: usize) -> Arc<MultiSampleBuffer> {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        Arc::new(MultiSampleBuffer::from_channels(vec![samples]))
    }

    fn play(manager: &mut NodeManager, frames: usize) -> MultiSampleBuffer {
        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(1, frames);
        manager.process(&input, &mut output, frames);
        output
    }

    #[test]
    fn player_stops_with_silence_at_buffer_end() {
        let mut manager = NodeManager::new(48000.0, 8, 0, 1);
        let player = manager.add_node(Box::new(BufferPlayerNode::new(ramp_buffer(12), 0, false)));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(player, 0), InputRef::new(out, 0));

        let output = play(&mut manager, 16);
        let channel = output.channel(0).unwrap();
        for i in 0..12 {
            assert_eq!(channel[i], i as f32);
        }
        assert!(channel[12..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn looping_player_wraps_around() {
        let mut manager = NodeManager::new(48000.0, 8, 0, 1);
        let player = manager.add_node(Box::new(BufferPlayerNode::new(ramp_buffer(6), 0, true)));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(player, 0), InputRef::new(out, 0));

        let output = play(&mut manager, 16);
        let channel = output.channel(0).unwrap();
        for (i, &sample) in channel.iter().enumerate() {
            assert_eq!(sample, (i % 6) as f32, "frame {i}");
        }
    }

    #[test]
    fn missing_channel_plays_silence() {
        let mut manager = NodeManager::new(48000.0, 8, 0, 1);
        let player = manager.add_node(Box::new(BufferPlayerNode::new(ramp_buffer(6), 7, false)));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(player, 0), InputRef::new(out, 0));

        let output = play(&mut manager, 8);
        assert!(output.channel(0).unwrap().iter().all(|&s| s == 0.0));
    }
}
