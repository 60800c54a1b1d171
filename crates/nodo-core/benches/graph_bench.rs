//! Criterion benchmarks for the pull-based node graph.
//!
//! Measures scheduler overhead independently of DSP cost using trivial
//! passthrough chains. Two axes:
//!
//! - **Chain depth** — pull recursion cost through linear chains
//! - **Fan-out** — memoization cost with one source shared by N consumers
//!
//! Run with: `cargo bench -p nodo-core -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nodo_core::nodes::{MixNode, OutputNode, PassthroughNode, SineNode};
use nodo_core::{InputRef, MultiSampleBuffer, NodeManager, OutputRef};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 64;
const FRAMES: usize = 512;

fn make_chain(depth: usize) -> NodeManager {
    let mut manager = NodeManager::new(SAMPLE_RATE, BLOCK_SIZE, 0, 1);
    let mut previous = manager.add_node(Box::new(SineNode::new(440.0)));
    for _ in 0..depth {
        let next = manager.add_node(Box::new(PassthroughNode::new()));
        manager.connect(OutputRef::new(previous, 0), InputRef::new(next, 0));
        previous = next;
    }
    let root = manager.add_root_node(Box::new(OutputNode::new(0)));
    manager.connect(OutputRef::new(previous, 0), InputRef::new(root, 0));
    manager
}

fn make_fanout(consumers: usize) -> NodeManager {
    let mut manager = NodeManager::new(SAMPLE_RATE, BLOCK_SIZE, 0, 1);
    let source = manager.add_node(Box::new(SineNode::new(440.0)));
    let join = manager.add_node(Box::new(MixNode::new(consumers)));
    for pin in 0..consumers {
        let through = manager.add_node(Box::new(PassthroughNode::new()));
        manager.connect(OutputRef::new(source, 0), InputRef::new(through, 0));
        manager.connect(OutputRef::new(through, 0), InputRef::new(join, pin as u16));
    }
    let root = manager.add_root_node(Box::new(OutputNode::new(0)));
    manager.connect(OutputRef::new(join, 0), InputRef::new(root, 0));
    manager
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/chain");
    for depth in [1usize, 8, 32, 128] {
        let mut manager = make_chain(depth);
        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(1, FRAMES);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                manager.process(black_box(&input), black_box(&mut output), FRAMES);
            });
        });
    }
    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/fanout");
    for consumers in [2usize, 8, 32] {
        let mut manager = make_fanout(consumers);
        let input = MultiSampleBuffer::default();
        let mut output = MultiSampleBuffer::new(1, FRAMES);
        group.bench_with_input(BenchmarkId::from_parameter(consumers), &consumers, |b, _| {
            b.iter(|| {
                manager.process(black_box(&input), black_box(&mut output), FRAMES);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain, bench_fanout);
criterion_main!(benches);
