//! Fan-in summing node.

use crate::node::{Node, ProcessContext};

/// Sums N input pins into one output, sample by sample.
///
/// Unconnected inputs contribute silence.
pub struct MixNode {
    inputs: usize,
}

impl MixNode {
    /// Creates a mixer with `inputs` input pins.
    pub fn new(inputs: usize) -> Self {
        Self { inputs }
    }
}

impl Node for MixNode {
    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let (inputs, outputs) = ctx.split();
        let out = outputs[0].as_mut_slice();
        out.fill(0.0);
        for pin in 0..self.inputs {
            if let Some(upstream) = inputs.pull(pin) {
                for (dst, &src) in out.iter_mut().zip(upstream.iter()) {
                    *dst += src;
                }
            }
        }
    }
}
