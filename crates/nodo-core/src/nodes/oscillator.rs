//! Sine oscillator.

use std::f32::consts::TAU;
use std::sync::Arc;

use libm::sinf;

use crate::node::{Node, ProcessContext};
use crate::params::AtomicParam;

/// Sine generator, 0 in / 1 out.
///
/// Frequency and amplitude are [`AtomicParam`]s retargetable from any
/// thread; frequency is read once per block, so modulation resolution is
/// the internal buffer size. Phase is continuous across frequency and
/// sample-rate changes.
pub struct SineNode {
    frequency: Arc<AtomicParam>,
    amplitude: Arc<AtomicParam>,
    phase: f32,
    sample_rate: f32,
}

impl SineNode {
    /// Creates an oscillator at `frequency` Hz with unit amplitude.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: AtomicParam::new(frequency),
            amplitude: AtomicParam::new(1.0),
            phase: 0.0,
            sample_rate: 44100.0,
        }
    }

    /// Returns the shared frequency parameter, in Hz.
    pub fn frequency(&self) -> Arc<AtomicParam> {
        Arc::clone(&self.frequency)
    }

    /// Returns the shared amplitude parameter (linear).
    pub fn amplitude(&self) -> Arc<AtomicParam> {
        Arc::clone(&self.amplitude)
    }
}

impl Node for SineNode {
    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let increment = self.frequency.get() / self.sample_rate;
        let amplitude = self.amplitude.get();
        for sample in ctx.output(0) {
            *sample = sinf(TAU * self.phase) * amplitude;
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
}
