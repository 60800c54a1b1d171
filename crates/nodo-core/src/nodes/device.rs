//! Device-boundary nodes.
//!
//! [`OutputNode`] is the canonical root node: it pulls its single input and
//! contributes the block to one hardware output channel. [`InputNode`] is
//! the matching leaf that exposes one hardware input channel to the graph.

use crate::node::{Node, ProcessContext};

/// Root node feeding one hardware output channel.
///
/// Register it with [`NodeManager::add_root_node`](crate::NodeManager::add_root_node)
/// (or promote it with `register_root`) so it is triggered every block.
/// An unconnected input produces silence on the channel.
pub struct OutputNode {
    channel: usize,
}

impl OutputNode {
    /// Creates a root node targeting hardware output `channel`.
    pub fn new(channel: usize) -> Self {
        Self { channel }
    }

    /// The hardware channel this node feeds.
    pub fn channel(&self) -> usize {
        self.channel
    }
}

impl Node for OutputNode {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let (inputs, outputs) = ctx.split();
        let staging = outputs[0].as_mut_slice();
        match inputs.pull(0) {
            Some(upstream) => staging.copy_from_slice(upstream),
            None => staging.fill(0.0),
        }
        ctx.route_to_channel(self.channel, 0);
    }
}

/// Leaf node reading one hardware input channel.
///
/// Produces silence when the channel does not exist on the current stream.
pub struct InputNode {
    channel: usize,
}

impl InputNode {
    /// Creates a node reading hardware input `channel`.
    pub fn new(channel: usize) -> Self {
        Self { channel }
    }
}

impl Node for InputNode {
    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let (inputs, outputs) = ctx.split();
        let out = outputs[0].as_mut_slice();
        match inputs.external(self.channel) {
            Some(external) => {
                let len = external.len().min(out.len());
                out[..len].copy_from_slice(&external[..len]);
                out[len..].fill(0.0);
            }
            None => out.fill(0.0),
        }
    }
}
