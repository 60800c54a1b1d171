//! Identity node, 1 in / 1 out.

use crate::node::{Node, ProcessContext};

/// Copies its input to its output unchanged.
///
/// Useful as a graph junction point and in tests exercising fan-out.
#[derive(Default)]
pub struct PassthroughNode;

impl PassthroughNode {
    /// Creates a passthrough node.
    pub fn new() -> Self {
        Self
    }
}

impl Node for PassthroughNode {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let (inputs, outputs) = ctx.split();
        let out = outputs[0].as_mut_slice();
        match inputs.pull(0) {
            Some(upstream) => out.copy_from_slice(upstream),
            None => out.fill(0.0),
        }
    }
}
