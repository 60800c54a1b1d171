//! The node abstraction and the context a node processes through.
//!
//! A [`Node`] is a unit of audio computation with a fixed number of input
//! and output pins. Its [`process`](Node::process) hook is invoked at most
//! once per internal block by the manager's pull protocol and fills every
//! output pin's buffer for that block.
//!
//! Realtime contract for `process`: deterministic given inputs and internal
//! state, no heap allocation, no blocking, no panics. Reading an unconnected
//! input yields `None` and must be treated as silence, never as an error.

use crate::buffer::{MultiSampleBuffer, SampleBuffer};
use crate::manager::{Entry, OutputMapping};
use crate::pin::{NodeId, OutputRef};

/// A unit of audio computation in the node graph.
///
/// Implementors declare their pin counts once; the manager allocates one
/// block-sized buffer per output pin and keeps them sized to the internal
/// buffer size for the node's whole lifetime.
pub trait Node: Send {
    /// Number of input pins.
    fn input_count(&self) -> usize;

    /// Number of output pins.
    fn output_count(&self) -> usize;

    /// Fills every output buffer for the current block.
    ///
    /// Called at most once per internal block, on the audio thread, after
    /// all nodes feeding this node's connected inputs have been processed
    /// for the same block.
    fn process(&mut self, ctx: &mut ProcessContext<'_>);

    /// Invoked when the manager's sample rate changes, and once on
    /// registration. Nodes with rate-dependent coefficients recompute here.
    fn sample_rate_changed(&mut self, _sample_rate: f32) {}

    /// Invoked when the manager's internal buffer size changes, and once on
    /// registration. Output buffers are resized by the manager itself; this
    /// hook is for node-internal state only.
    fn buffer_size_changed(&mut self, _buffer_size: usize) {}
}

/// Read-only view of a node's input pins and the hardware input, valid for
/// one `process` call.
pub struct Inputs<'a> {
    pub(crate) entries: &'a [Option<Entry>],
    pub(crate) node: NodeId,
    pub(crate) external: &'a MultiSampleBuffer,
    pub(crate) offset: usize,
    pub(crate) buffer_size: usize,
}

impl<'a> Inputs<'a> {
    /// Pulls the block computed behind input pin `pin`.
    ///
    /// Returns `None` when the pin is unconnected (or out of range); the
    /// caller treats that as a zero-filled contribution. Never allocates.
    pub fn pull(&self, pin: usize) -> Option<&'a [f32]> {
        let entry = self.entries.get(self.node.0 as usize)?.as_ref()?;
        let source = (*entry.pins.upstream.get(pin)?)?;
        let upstream = self.entries.get(source.node.0 as usize)?.as_ref()?;
        Some(upstream.buffers.get(source.pin as usize)?.as_slice())
    }

    /// Returns the current block's region of hardware input `channel`, or
    /// `None` when the channel does not exist.
    ///
    /// The slice is shorter than the internal buffer size only when the
    /// device callback violated the divisibility constraint documented on
    /// [`NodeManager::process`](crate::NodeManager::process).
    pub fn external(&self, channel: usize) -> Option<&'a [f32]> {
        let samples = self.external.channel(channel)?;
        let start = self.offset.min(samples.len());
        let end = (self.offset + self.buffer_size).min(samples.len());
        Some(&samples[start..end])
    }
}

/// Everything a node sees while processing one internal block.
pub struct ProcessContext<'a> {
    pub(crate) inputs: Inputs<'a>,
    pub(crate) outputs: &'a mut [SampleBuffer],
    pub(crate) mapping: &'a mut OutputMapping,
    pub(crate) sample_rate: f32,
    pub(crate) buffer_size: usize,
    pub(crate) sample_time: u64,
}

impl<'a> ProcessContext<'a> {
    /// Splits the context into the input view and this node's output
    /// buffers, so upstream data can be read while outputs are written.
    #[inline]
    pub fn split(&mut self) -> (&Inputs<'a>, &mut [SampleBuffer]) {
        (&self.inputs, &mut *self.outputs)
    }

    /// Pulls input pin `pin`; `None` means unconnected (silence).
    #[inline]
    pub fn input(&self, pin: usize) -> Option<&[f32]> {
        self.inputs.pull(pin)
    }

    /// Returns the mutable buffer of output pin `pin`.
    ///
    /// # Panics
    ///
    /// Panics if `pin` is not a valid output pin index.
    #[inline]
    pub fn output(&mut self, pin: usize) -> &mut [f32] {
        self.outputs[pin].as_mut_slice()
    }

    /// Contributes output pin `pin` of this node to hardware output
    /// `channel` for the current block.
    ///
    /// Only meaningful from root nodes; contributions to the same channel
    /// from multiple nodes are summed by the manager after all roots ran.
    /// Out-of-range channels are ignored.
    pub fn route_to_channel(&mut self, channel: usize, pin: u16) {
        if let Some(contributions) = self.mapping.get_mut(channel) {
            contributions.push(OutputRef::new(self.inputs.node, pin));
        }
    }

    /// Sample rate the graph runs on, in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Length of the block being processed.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Absolute sample time of the first sample in this block.
    #[inline]
    pub fn sample_time(&self) -> u64 {
        self.sample_time
    }

    /// Returns the current block's region of hardware input `channel`.
    #[inline]
    pub fn external_input(&self, channel: usize) -> Option<&[f32]> {
        self.inputs.external(channel)
    }
}
