//! Property-based tests for the node graph engine.
//!
//! Uses proptest to check summation linearity, connection bookkeeping
//! consistency, and scheduler memoization over randomized graphs and block
//! counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use nodo_core::nodes::{MixNode, OutputNode, PassthroughNode, SineNode};
use nodo_core::{InputRef, MultiSampleBuffer, Node, NodeManager, OutputRef, ProcessContext};

struct Constant {
    value: f32,
    calls: Arc<AtomicUsize>,
}

impl Constant {
    fn new(value: f32) -> Self {
        Self {
            value,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Node for Constant {
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

fn process_frames(manager: &mut NodeManager, channels: usize, frames: usize) -> MultiSampleBuffer {
    let input = MultiSampleBuffer::default();
    let mut output = MultiSampleBuffer::new(channels, frames);
    manager.process(&input, &mut output, frames);
    output
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Two constant roots summed into one channel produce exactly `a + b`
    /// on every sample, for any block count.
    #[test]
    fn summation_is_exact_for_constant_roots(
        a in -10.0f32..10.0f32,
        b in -10.0f32..10.0f32,
        blocks in 1usize..16,
    ) {
        let block_size = 64;
        let mut manager = NodeManager::new(48000.0, block_size, 0, 1);
        for value in [a, b] {
            let source = manager.add_node(Box::new(Constant::new(value)));
            let root = manager.add_root_node(Box::new(OutputNode::new(0)));
            manager.connect(OutputRef::new(source, 0), InputRef::new(root, 0));
        }

        let output = process_frames(&mut manager, 1, blocks * block_size);
        for &sample in output.channel(0).unwrap().iter() {
            prop_assert!((sample - (a + b)).abs() < 1e-5, "got {sample}, expected {}", a + b);
        }
    }

    /// A node with N passthrough consumers is still processed exactly once
    /// per block.
    #[test]
    fn memoization_is_independent_of_fanout(
        consumers in 1usize..8,
        blocks in 1usize..8,
    ) {
        let block_size = 32;
        let mut manager = NodeManager::new(48000.0, block_size, 0, 1);
        let shared = Constant::new(1.0);
        let calls = Arc::clone(&shared.calls);
        let source = manager.add_node(Box::new(shared));

        let join = manager.add_node(Box::new(MixNode::new(consumers)));
        for pin in 0..consumers {
            let through = manager.add_node(Box::new(PassthroughNode::new()));
            manager.connect(OutputRef::new(source, 0), InputRef::new(through, 0));
            manager.connect(
                OutputRef::new(through, 0),
                InputRef::new(join, pin as u16),
            );
        }
        let root = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(join, 0), InputRef::new(root, 0));

        let output = process_frames(&mut manager, 1, blocks * block_size);
        prop_assert_eq!(calls.load(Ordering::Relaxed), blocks);
        for &sample in output.channel(0).unwrap().iter() {
            prop_assert!((sample - consumers as f32).abs() < 1e-4);
        }
    }

    /// Arbitrary connect/disconnect sequences keep both sides of every
    /// connection consistent: the consumer count of each output equals the
    /// number of inputs referencing it.
    #[test]
    fn connection_bookkeeping_stays_consistent(
        ops in prop::collection::vec((0usize..4, 0usize..4, prop::bool::ANY), 1..64),
    ) {
        let mut manager = NodeManager::new(48000.0, 64, 0, 1);
        let sources: Vec<_> = (0..4)
            .map(|_| manager.add_node(Box::new(PassthroughNode::new())))
            .collect();
        let sinks: Vec<_> = (0..4)
            .map(|_| manager.add_node(Box::new(PassthroughNode::new())))
            .collect();

        for (from, to, is_connect) in ops {
            let output = OutputRef::new(sources[from], 0);
            let input = InputRef::new(sinks[to], 0);
            if is_connect {
                manager.connect(output, input);
            } else {
                manager.disconnect(input);
            }

            // Invariant check over the whole graph after every operation.
            for &source in &sources {
                let output = OutputRef::new(source, 0);
                let referencing = sinks
                    .iter()
                    .filter(|&&sink| {
                        manager.input_source(InputRef::new(sink, 0)) == Some(output)
                    })
                    .count();
                prop_assert_eq!(manager.consumer_count(output), referencing);
            }
        }
    }

    /// The oscillator stays finite and within amplitude bounds for any
    /// audible frequency and block size.
    #[test]
    fn sine_output_is_always_bounded(
        frequency in 20.0f32..20000.0f32,
        block_size in 16usize..256,
    ) {
        let mut manager = NodeManager::new(48000.0, block_size, 0, 1);
        let osc = manager.add_node(Box::new(SineNode::new(frequency)));
        let root = manager.add_root_node(Box::new(OutputNode::new(0)));
        manager.connect(OutputRef::new(osc, 0), InputRef::new(root, 0));

        let output = process_frames(&mut manager, 1, block_size * 8);
        for &sample in output.channel(0).unwrap().iter() {
            prop_assert!(sample.is_finite());
            prop_assert!(sample.abs() <= 1.0 + 1e-5);
        }
    }
}
