//! Built-in node library.
//!
//! Generators, utilities, and the device-boundary nodes that bridge the
//! graph to the hardware callback. Custom nodes implement
//! [`Node`](crate::Node) directly; these cover the common plumbing.

mod device;
mod gain;
mod mix;
mod oscillator;
mod passthrough;
mod player;

pub use device::{InputNode, OutputNode};
pub use gain::GainNode;
pub use mix::MixNode;
pub use oscillator::SineNode;
pub use passthrough::PassthroughNode;
pub use player::BufferPlayerNode;
