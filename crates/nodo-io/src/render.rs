//! Offline rendering: drive the graph without an audio device.

use nodo_core::{MultiSampleBuffer, NodeManager};

/// Renders `frames` samples of graph output offline.
///
/// Runs the same block loop the device callback would, with no hardware
/// input. The frame count is rounded up internally to a whole number of
/// blocks and the result trimmed back, so any length renders correctly.
pub fn render(manager: &mut NodeManager, frames: usize) -> MultiSampleBuffer {
    let channels = manager.output_channel_count();
    let block = manager.internal_buffer_size();
    let padded = frames.div_ceil(block) * block;

    let input = MultiSampleBuffer::default();
    let mut output = MultiSampleBuffer::new(channels, padded);
    manager.process(&input, &mut output, padded);
    output.resize(channels, frames);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodo_core::nodes::{OutputNode, SineNode};
    use nodo_core::{InputRef, OutputRef};

    #[test]
    fn render_trims_to_requested_length() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 2);
        let osc = manager.add_node(Box::new(SineNode::new(440.0)));
        let root = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(osc, 0), InputRef::new(root, 0));

        let output = render(&mut manager, 1000);
        assert_eq!(output.channel_count(), 2);
        assert_eq!(output.frame_count(), 1000);
        // Channel 0 carries the oscillator, channel 1 stays silent.
        assert!(output.channel(0).unwrap().iter().any(|&s| s != 0.0));
        assert!(output.channel(1).unwrap().iter().all(|&s| s == 0.0));
    }
}
