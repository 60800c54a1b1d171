//! Smoothed gain stage.

use std::sync::Arc;

use crate::node::{Node, ProcessContext};
use crate::params::{AtomicParam, Smoother};

/// Multiplies its input by a gain factor, 1 in / 1 out.
///
/// The gain target is an [`AtomicParam`] so any thread may retarget it while
/// audio runs; the applied value ramps toward the target per sample.
pub struct GainNode {
    gain: Arc<AtomicParam>,
    smoother: Smoother,
}

impl GainNode {
    /// Smoothing time constant for gain changes, in milliseconds.
    const SMOOTHING_MS: f32 = 10.0;

    /// Creates a gain stage with an initial linear gain factor.
    pub fn new(gain: f32) -> Self {
        Self {
            gain: AtomicParam::new(gain),
            smoother: Smoother::new(gain, Self::SMOOTHING_MS, 44100.0),
        }
    }

    /// Returns the shared gain parameter for control-thread use.
    pub fn gain(&self) -> Arc<AtomicParam> {
        Arc::clone(&self.gain)
    }
}

impl Node for GainNode {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let target = self.gain.get();
        let (inputs, outputs) = ctx.split();
        let out = outputs[0].as_mut_slice();
        match inputs.pull(0) {
            Some(upstream) => {
                for (dst, &src) in out.iter_mut().zip(upstream.iter()) {
                    *dst = src * self.smoother.advance(target);
                }
            }
            None => {
                // Keep the ramp moving so a later connection starts from
                // the current target, then emit silence.
                for _ in 0..out.len() {
                    self.smoother.advance(target);
                }
                out.fill(0.0);
            }
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.smoother.set_sample_rate(sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MultiSampleBuffer;
    use crate::manager::NodeManager;
    use crate::nodes::OutputNode;
    use crate::pin::{InputRef, OutputRef};

    struct One;
    impl Node for One {
        fn input_count(&self) -> usize {
            0
        }
        fn output_count(&self) -> usize {
            1
        }
        fn process(&mut self, ctx: &mut ProcessContext<'_>) {
            ctx.output(0).fill(1.0);
        }
    }

    #[test]
    fn gain_scales_input() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let source = manager.add_node(Box::new(One));
        let gain = manager.add_node(Box::new(GainNode::new(0.5)));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(source, 0), InputRef::new(gain, 0));
        manager.connect(OutputRef::new(gain, 0), InputRef::new(out, 0));

        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(1, 64);
        manager.process(&input, &mut output, 64);
        for &sample in output.channel(0).unwrap().iter() {
            assert!((sample - 0.5).abs() < 1e-6, "got {sample}");
        }
    }

    #[test]
    fn gain_retarget_ramps_to_new_value() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let source = manager.add_node(Box::new(One));
        let gain_node = GainNode::new(1.0);
        let param = gain_node.gain();
        let gain = manager.add_node(Box::new(gain_node));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(source, 0), InputRef::new(gain, 0));
        manager.connect(OutputRef::new(gain, 0), InputRef::new(out, 0));

        param.set(0.0);
        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(1, 48000);
        manager.process(&input, &mut output, 48000);
        // After a full second the ramp has settled on the new target.
        let last = *output.channel(0).unwrap().last().unwrap();
        assert!(last.abs() < 1e-3, "got {last}");
    }
}
