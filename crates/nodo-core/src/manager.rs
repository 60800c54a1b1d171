//! The node manager: arena, pull protocol, and block scheduler.
//!
//! [`NodeManager`] owns every node in the graph (arena of stable ids, the
//! redesign of the original weak-registry scheme), the set of root nodes,
//! the global processing parameters, and the cross-thread task queue. The
//! device callback hands it planar hardware buffers once per callback via
//! [`process`](NodeManager::process); the manager subdivides them into
//! fixed-size internal blocks and drives the graph once per block.
//!
//! # Pull protocol
//!
//! Root nodes are triggered unconditionally every internal block, in
//! registration order. Before any node's `process` hook runs, the manager
//! recursively pulls the nodes behind its connected input pins and memoizes
//! completion per node on a last-calculated-sample timestamp. A node read by
//! several downstream consumers within one block is therefore processed
//! exactly once per block, including diamond-shaped fan-out.
//!
//! Connection cycles are not detected; a cycle makes the pull recursion
//! non-terminating and is the graph author's responsibility to avoid.

use std::mem;

use crate::buffer::{MultiSampleBuffer, SampleBuffer};
use crate::node::{Inputs, Node, ProcessContext};
use crate::pin::{InputRef, NodeId, OutputRef, PinState};
use crate::task_queue::{TaskQueue, TaskSender};

/// Per-channel contribution lists, rebuilt every internal block.
pub(crate) type OutputMapping = Vec<Vec<OutputRef>>;

/// Arena slot for one registered node.
pub(crate) struct Entry {
    /// Taken out for the duration of the node's own `process` call.
    pub(crate) node: Option<Box<dyn Node>>,
    pub(crate) pins: PinState,
    /// One block-sized buffer per output pin; length always equals the
    /// manager's internal buffer size.
    pub(crate) buffers: Vec<SampleBuffer>,
    /// Absolute sample time up to which this node's outputs are valid.
    pub(crate) last_calculated: u64,
}

/// Owner and scheduler of the audio node graph.
pub struct NodeManager {
    entries: Vec<Option<Entry>>,
    next_id: u32,
    roots: Vec<NodeId>,
    sample_rate: f32,
    buffer_size: usize,
    input_channels: usize,
    output_channels: usize,
    sample_time: u64,
    mapping: OutputMapping,
    tasks: TaskQueue,
}

impl NodeManager {
    /// Creates a manager with the given global processing parameters.
    ///
    /// # Panics
    ///
    /// Panics if `internal_buffer_size` is zero.
    pub fn new(
        sample_rate: f32,
        internal_buffer_size: usize,
        input_channels: usize,
        output_channels: usize,
    ) -> Self {
        assert!(internal_buffer_size > 0, "internal buffer size must be > 0");
        Self {
            entries: Vec::new(),
            next_id: 0,
            roots: Vec::new(),
            sample_rate,
            buffer_size: internal_buffer_size,
            input_channels,
            output_channels,
            sample_time: 0,
            mapping: (0..output_channels).map(|_| Vec::new()).collect(),
            tasks: TaskQueue::new(),
        }
    }

    // --- Registration ---

    /// Registers a node and returns its id.
    ///
    /// The node receives the current sample rate and internal buffer size
    /// through its hooks, and one block-sized buffer is allocated per
    /// output pin.
    pub fn add_node(&mut self, mut node: Box<dyn Node>) -> NodeId {
        node.sample_rate_changed(self.sample_rate);
        node.buffer_size_changed(self.buffer_size);

        let id = NodeId(self.next_id);
        self.next_id += 1;
        let inputs = node.input_count();
        let outputs = node.output_count();
        self.entries.push(Some(Entry {
            node: Some(node),
            pins: PinState::new(inputs, outputs),
            buffers: (0..outputs)
                .map(|_| SampleBuffer::new(self.buffer_size))
                .collect(),
            last_calculated: 0,
        }));
        tracing::debug!("graph: add node {id} ({inputs} in, {outputs} out)");
        id
    }

    /// Registers a node and immediately promotes it to the root set.
    pub fn add_root_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = self.add_node(node);
        self.register_root(id);
        id
    }

    /// Adds `id` to the root set; roots are triggered unconditionally once
    /// per internal block, in registration order. Idempotent.
    pub fn register_root(&mut self, id: NodeId) {
        if self.entry(id).is_some() && !self.roots.contains(&id) {
            self.roots.push(id);
            tracing::debug!("graph: register root {id}");
        }
    }

    /// Removes `id` from the root set. Idempotent.
    pub fn unregister_root(&mut self, id: NodeId) {
        self.roots.retain(|&root| root != id);
    }

    /// Unregisters and drops a node.
    ///
    /// Every input pin connected to one of the node's outputs is
    /// disconnected first, and the node's own connections release their
    /// back-references, so no handle into the removed slot survives.
    pub fn remove_node(&mut self, id: NodeId) {
        let Some(entry) = self.entries.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        for consumers in &entry.pins.consumers {
            for input in consumers {
                if let Some(downstream) = self.entry_mut(input.node)
                    && let Some(slot) = downstream.pins.upstream.get_mut(input.pin as usize)
                {
                    *slot = None;
                }
            }
        }
        for source in entry.pins.upstream.iter().flatten() {
            if let Some(upstream) = self.entry_mut(source.node)
                && let Some(consumers) = upstream.pins.consumers.get_mut(source.pin as usize)
            {
                consumers.retain(|input| input.node != id);
            }
        }
        self.unregister_root(id);
        tracing::debug!("graph: remove node {id}");
    }

    /// Returns true if `id` is currently registered.
    pub fn is_registered(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Number of registered root nodes.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    // --- Connections ---

    /// Connects output pin `from` to input pin `to`.
    ///
    /// Replaces any existing connection on `to`, keeping both
    /// back-reference sets consistent. Stale or out-of-range handles are a
    /// logged no-op — connection errors are never raised.
    pub fn connect(&mut self, from: OutputRef, to: InputRef) {
        let from_valid = self
            .entry(from.node)
            .is_some_and(|e| (from.pin as usize) < e.pins.consumers.len());
        let to_valid = self
            .entry(to.node)
            .is_some_and(|e| (to.pin as usize) < e.pins.upstream.len());
        if !from_valid || !to_valid {
            tracing::warn!("graph: connect {from:?} -> {to:?} ignored, stale handle");
            return;
        }

        self.disconnect(to);
        if let Some(entry) = self.entry_mut(to.node) {
            entry.pins.upstream[to.pin as usize] = Some(from);
        }
        if let Some(entry) = self.entry_mut(from.node) {
            entry.pins.consumers[from.pin as usize].push(to);
        }
        tracing::debug!(
            "graph: connect {} pin {} -> {} pin {}",
            from.node,
            from.pin,
            to.node,
            to.pin
        );
    }

    /// Disconnects input pin `to` from whatever feeds it. Idempotent.
    pub fn disconnect(&mut self, to: InputRef) {
        let source = self
            .entry_mut(to.node)
            .and_then(|e| e.pins.upstream.get_mut(to.pin as usize))
            .and_then(Option::take);
        if let Some(source) = source
            && let Some(upstream) = self.entry_mut(source.node)
            && let Some(consumers) = upstream.pins.consumers.get_mut(source.pin as usize)
        {
            consumers.retain(|&input| input != to);
        }
    }

    /// Returns the output currently feeding input pin `input`, if any.
    pub fn input_source(&self, input: InputRef) -> Option<OutputRef> {
        self.entry(input.node)?
            .pins
            .upstream
            .get(input.pin as usize)
            .copied()
            .flatten()
    }

    /// Number of inputs currently connected to output pin `output`.
    pub fn consumer_count(&self, output: OutputRef) -> usize {
        self.entry(output.node)
            .and_then(|e| e.pins.consumers.get(output.pin as usize))
            .map_or(0, Vec::len)
    }

    // --- Global parameters ---

    /// Sample rate the graph runs on, in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of audio samples per millisecond at the current sample rate.
    pub fn samples_per_millisecond(&self) -> f32 {
        self.sample_rate / 1000.0
    }

    /// The internal block size in samples.
    ///
    /// Can be smaller than the device callback's frame count; it bounds the
    /// timing accuracy of queued graph mutations.
    pub fn internal_buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Absolute sample time: total samples processed since creation.
    pub fn sample_time(&self) -> u64 {
        self.sample_time
    }

    /// Number of hardware input channels fed into the graph.
    pub fn input_channel_count(&self) -> usize {
        self.input_channels
    }

    /// Number of hardware output channels the graph renders.
    pub fn output_channel_count(&self) -> usize {
        self.output_channels
    }

    /// Changes the sample rate and notifies every registered node.
    ///
    /// Only call before the stream starts or from a queued task.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        tracing::debug!("graph: sample rate -> {sample_rate} Hz");
        for entry in self.entries.iter_mut().flatten() {
            if let Some(node) = entry.node.as_mut() {
                node.sample_rate_changed(sample_rate);
            }
        }
    }

    /// Changes the internal block size, resizes every output pin buffer to
    /// match, and notifies every registered node.
    ///
    /// Only call before the stream starts or from a queued task.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn set_internal_buffer_size(&mut self, size: usize) {
        assert!(size > 0, "internal buffer size must be > 0");
        self.buffer_size = size;
        tracing::debug!("graph: internal buffer size -> {size}");
        for entry in self.entries.iter_mut().flatten() {
            for buffer in &mut entry.buffers {
                buffer.resize(size);
            }
            if let Some(node) = entry.node.as_mut() {
                node.buffer_size_changed(size);
            }
        }
    }

    /// Sets the number of hardware input channels.
    pub fn set_input_channel_count(&mut self, channels: usize) {
        self.input_channels = channels;
    }

    /// Sets the number of hardware output channels.
    pub fn set_output_channel_count(&mut self, channels: usize) {
        self.output_channels = channels;
        self.mapping.resize_with(channels, Vec::new);
    }

    /// Returns a cloneable handle for enqueueing graph mutations from other
    /// threads.
    pub fn task_sender(&self) -> TaskSender {
        self.tasks.sender()
    }

    // --- Processing ---

    /// Drives the whole graph for one device callback.
    ///
    /// Invoked on the audio thread, once per hardware callback, with planar
    /// input and output buffers. Queued tasks are drained first, the output
    /// is zeroed, then `frames` is consumed in internal-block steps: every
    /// root node is triggered (pulling its subgraph), and all buffers routed
    /// to an output channel are summed into that channel's region.
    ///
    /// `frames` must be a whole multiple of the internal buffer size; this
    /// is a configuration constraint, not a runtime check. With a
    /// non-conforming frame count the final partial region receives only
    /// the leading samples of the last block.
    pub fn process(
        &mut self,
        input: &MultiSampleBuffer,
        output: &mut MultiSampleBuffer,
        frames: usize,
    ) {
        self.drain_tasks();

        debug_assert!(
            frames % self.buffer_size == 0,
            "frames per buffer ({frames}) must be a multiple of the internal buffer size ({})",
            self.buffer_size
        );

        for channel in output.channels_mut() {
            let len = channel.len().min(frames);
            channel.as_mut_slice()[..len].fill(0.0);
        }

        let mut mapping = mem::take(&mut self.mapping);
        let mut offset = 0;
        while offset < frames {
            for contributions in &mut mapping {
                contributions.clear();
            }

            for index in 0..self.roots.len() {
                let root = self.roots[index];
                self.pull_node(root, input, offset, &mut mapping);
            }

            for (channel_index, contributions) in mapping.iter().enumerate() {
                let Some(channel) = output.channel_mut(channel_index) else {
                    continue;
                };
                let Some(region) = channel.as_mut_slice().get_mut(offset..) else {
                    continue;
                };
                for &source in contributions {
                    let Some(buffer) = self.output_buffer(source) else {
                        continue;
                    };
                    for (dst, src) in region.iter_mut().zip(buffer.iter()) {
                        *dst += *src;
                    }
                }
            }

            offset += self.buffer_size;
            self.sample_time += self.buffer_size as u64;
        }
        self.mapping = mapping;
    }

    /// Runs queued tasks in enqueue order.
    ///
    /// Only tasks present when the drain starts are run; tasks enqueued by
    /// a running task wait for the next callback.
    fn drain_tasks(&mut self) {
        let receiver = self.tasks.receiver();
        for _ in 0..receiver.len() {
            match receiver.try_recv() {
                Ok(task) => task(self),
                Err(_) => break,
            }
        }
    }

    /// Evaluates `id` for the block starting at `offset`, first pulling
    /// every node feeding its connected inputs. Memoized per block.
    fn pull_node(
        &mut self,
        id: NodeId,
        input: &MultiSampleBuffer,
        offset: usize,
        mapping: &mut OutputMapping,
    ) {
        let fresh_at = self.sample_time + self.buffer_size as u64;
        let input_count = {
            let Some(entry) = self.entry(id) else { return };
            if entry.last_calculated >= fresh_at {
                return;
            }
            entry.pins.upstream.len()
        };

        for pin in 0..input_count {
            let source = self
                .entry(id)
                .and_then(|e| e.pins.upstream.get(pin).copied().flatten());
            if let Some(source) = source {
                self.pull_node(source.node, input, offset, mapping);
            }
        }

        let Some(entry) = self.entry_mut(id) else { return };
        entry.last_calculated = fresh_at;
        let Some(mut node) = entry.node.take() else {
            return;
        };
        let mut buffers = mem::take(&mut entry.buffers);

        {
            let mut ctx = ProcessContext {
                inputs: Inputs {
                    entries: &self.entries,
                    node: id,
                    external: input,
                    offset,
                    buffer_size: self.buffer_size,
                },
                outputs: buffers.as_mut_slice(),
                mapping,
                sample_rate: self.sample_rate,
                buffer_size: self.buffer_size,
                sample_time: self.sample_time,
            };
            node.process(&mut ctx);
        }

        if let Some(entry) = self.entry_mut(id) {
            entry.node = Some(node);
            entry.buffers = buffers;
        }
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.entries.get(id.0 as usize)?.as_ref()
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.entries.get_mut(id.0 as usize)?.as_mut()
    }

    fn output_buffer(&self, source: OutputRef) -> Option<&SampleBuffer> {
        self.entry(source.node)?.buffers.get(source.pin as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{MixNode, OutputNode, PassthroughNode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits a constant value and counts its `process` invocations.
    struct ConstantNode {
        value: f32,
        calls: Arc<AtomicUsize>,
    }

    impl ConstantNode {
        fn new(value: f32) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    value,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl Node for ConstantNode {
        fn input_count(&self) -> usize {
            0
        }
        fn output_count(&self) -> usize {
            1
        }
        fn process(&mut self, ctx: &mut ProcessContext<'_>) {
            self.calls.fetch_add(1, Ordering::Relaxed);
            ctx.output(0).fill(self.value);
        }
    }

    fn run_blocks(manager: &mut NodeManager, channels: usize, frames: usize) -> MultiSampleBuffer {
        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(channels, frames);
        manager.process(&input, &mut output, frames);
        output
    }

    #[test]
    fn constant_reaches_output_channel() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let (constant, _) = ConstantNode::new(0.5);
        let source = manager.add_node(Box::new(constant));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(source, 0), InputRef::new(out, 0));

        let output = run_blocks(&mut manager, 1, 256);
        for &sample in output.channel(0).unwrap().iter() {
            assert_eq!(sample, 0.5);
        }
    }

    #[test]
    fn diamond_fanout_processes_source_once_per_block() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let (constant, calls) = ConstantNode::new(1.0);
        let source = manager.add_node(Box::new(constant));
        let left = manager.add_node(Box::new(PassthroughNode::new()));
        let right = manager.add_node(Box::new(PassthroughNode::new()));
        let mix = manager.add_node(Box::new(MixNode::new(2)));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));

        manager.connect(OutputRef::new(source, 0), InputRef::new(left, 0));
        manager.connect(OutputRef::new(source, 0), InputRef::new(right, 0));
        manager.connect(OutputRef::new(left, 0), InputRef::new(mix, 0));
        manager.connect(OutputRef::new(right, 0), InputRef::new(mix, 1));
        manager.connect(OutputRef::new(mix, 0), InputRef::new(out, 0));

        let output = run_blocks(&mut manager, 1, 256);
        // 256 frames at block size 64 -> exactly 4 blocks, one call each.
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        for &sample in output.channel(0).unwrap().iter() {
            assert_eq!(sample, 2.0);
        }
    }

    #[test]
    fn tasks_run_before_triggering_in_enqueue_order() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let sender = manager.task_sender();

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for label in ["t1", "t2", "t3"] {
            let order = Arc::clone(&order);
            sender.enqueue(move |_| order.lock().unwrap().push(label));
        }
        run_blocks(&mut manager, 1, 64);
        assert_eq!(*order.lock().unwrap(), vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn task_can_mutate_the_graph() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let sender = manager.task_sender();
        sender.enqueue(|manager| {
            let (constant, _) = ConstantNode::new(0.25);
            let source = manager.add_node(Box::new(constant));
            let out = manager.add_root_node(Box::new(OutputNode::new(0)));
            manager.connect(OutputRef::new(source, 0), InputRef::new(out, 0));
        });

        let output = run_blocks(&mut manager, 1, 64);
        assert_eq!(output.channel(0).unwrap()[0], 0.25);
    }

    #[test]
    fn remove_node_clears_consumer_references() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let (constant, _) = ConstantNode::new(1.0);
        let source = manager.add_node(Box::new(constant));
        let out = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(source, 0), InputRef::new(out, 0));

        manager.remove_node(source);
        assert!(!manager.is_registered(source));
        assert!(manager.input_source(InputRef::new(out, 0)).is_none());

        // Downstream now pulls silence.
        let output = run_blocks(&mut manager, 1, 64);
        for &sample in output.channel(0).unwrap().iter() {
            assert_eq!(sample, 0.0);
        }
    }

    #[test]
    fn remove_node_releases_upstream_back_references() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let (constant, _) = ConstantNode::new(1.0);
        let source = manager.add_node(Box::new(constant));
        let through = manager.add_node(Box::new(PassthroughNode::new()));
        manager.connect(OutputRef::new(source, 0), InputRef::new(through, 0));

        assert_eq!(manager.consumer_count(OutputRef::new(source, 0)), 1);
        manager.remove_node(through);
        assert_eq!(manager.consumer_count(OutputRef::new(source, 0)), 0);
    }

    #[test]
    fn sample_time_advances_per_block() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        run_blocks(&mut manager, 1, 256);
        assert_eq!(manager.sample_time(), 256);
        run_blocks(&mut manager, 1, 128);
        assert_eq!(manager.sample_time(), 384);
    }

    #[test]
    fn stale_connect_is_ignored() {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let (constant, _) = ConstantNode::new(1.0);
        let source = manager.add_node(Box::new(constant));
        manager.remove_node(source);

        let through = manager.add_node(Box::new(PassthroughNode::new()));
        manager.connect(OutputRef::new(source, 0), InputRef::new(through, 0));
        assert!(manager.input_source(InputRef::new(through, 0)).is_none());
    }
}
