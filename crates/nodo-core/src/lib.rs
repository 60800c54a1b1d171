//! nodo-core — pull-based audio node graph engine.
//!
//! A node graph for realtime audio: nodes expose input and output pins,
//! connections carry mono signals, and a [`NodeManager`] drives the whole
//! graph once per device callback in fixed-size internal blocks.
//!
//! # Core Abstractions
//!
//! - [`Node`] — object-safe trait for all audio computations
//! - [`NodeManager`] — owns the graph, schedules it block by block, and
//!   memoizes evaluation so shared nodes compute once per block
//! - [`InputRef`] / [`OutputRef`] — stable pin handles used to wire the graph
//! - [`TaskSender`] — cross-thread gateway for mutating a live graph
//! - [`AtomicParam`] — lock-free value channel for realtime parameter changes
//!
//! # Example
//!
//! ```rust
//! use nodo_core::{InputRef, MultiSampleBuffer, NodeManager, OutputRef};
//! use nodo_core::nodes::{OutputNode, SineNode};
//!
//! let mut manager = NodeManager::new(48000.0, 64, 0, 2);
//! let osc = manager.add_node(Box::new(SineNode::new(440.0)));
//! let speaker = manager.add_root_node(Box::new(OutputNode::new(0)));
//! manager.connect(OutputRef::new(osc, 0), InputRef::new(speaker, 0));
//!
//! // Normally invoked by the device callback.
//! let input = MultiSampleBuffer::default();
//! let mut output = MultiSampleBuffer::new(2, 256);
//! manager.process(&input, &mut output, 256);
//! ```
//!
//! # Threading Model
//!
//! Exactly one thread — the device callback thread — calls
//! [`NodeManager::process`]. All structural changes to a live graph go
//! through the task queue and run at the top of the next callback; parameter
//! values use [`AtomicParam`]. The processing path performs no heap
//! allocation, takes no locks, and raises no errors: unconnected inputs
//! degrade to silence.

pub mod buffer;
pub mod manager;
pub mod node;
pub mod nodes;
pub mod params;
pub mod pin;
pub mod task_queue;

pub use buffer::{MultiSampleBuffer, SampleBuffer};
pub use manager::NodeManager;
pub use node::{Inputs, Node, ProcessContext};
pub use params::{AtomicParam, Smoother};
pub use pin::{InputRef, NodeId, OutputRef};
pub use task_queue::{Task, TaskSender};
