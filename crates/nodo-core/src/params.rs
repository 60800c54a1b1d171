//! Lock-free parameters for realtime-safe cross-thread control.
//!
//! Structural graph changes go through the task queue; high-frequency value
//! changes (gain, frequency) must not. An [`AtomicParam`] stores an `f32` as
//! atomic bits so any thread can retarget it while the audio thread reads it
//! without locking, and [`Smoother`] ramps the audio-side value toward the
//! target to keep parameter jumps click-free.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use libm::expf;

/// An `f32` parameter shared between control and audio threads.
///
/// Stored as raw bits in an `AtomicU32`; loads and stores are relaxed, which
/// is sufficient for independent parameter values.
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU32,
}

impl AtomicParam {
    /// Creates a shared parameter with an initial value.
    pub fn new(value: f32) -> Arc<Self> {
        Arc::new(Self {
            bits: AtomicU32::new(value.to_bits()),
        })
    }

    /// Sets the target value. Callable from any thread.
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Reads the current target value. Callable from any thread.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// One-pole smoothing of a parameter value on the audio thread.
///
/// `advance` moves the held value a fixed fraction of the remaining distance
/// toward the target each sample, giving an exponential ramp with the
/// configured time constant.
#[derive(Debug, Clone)]
pub struct Smoother {
    current: f32,
    coeff: f32,
    time_ms: f32,
}

impl Smoother {
    /// Creates a smoother holding `initial`, with time constant `time_ms`
    /// milliseconds at `sample_rate` Hz.
    pub fn new(initial: f32, time_ms: f32, sample_rate: f32) -> Self {
        let mut smoother = Self {
            current: initial,
            coeff: 1.0,
            time_ms,
        };
        smoother.set_sample_rate(sample_rate);
        smoother
    }

    /// Recomputes the smoothing coefficient for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = if self.time_ms <= 0.0 || sample_rate <= 0.0 {
            1.0
        } else {
            1.0 - expf(-1.0 / (0.001 * self.time_ms * sample_rate))
        };
    }

    /// Advances one sample toward `target` and returns the smoothed value.
    #[inline]
    pub fn advance(&mut self, target: f32) -> f32 {
        self.current += self.coeff * (target - self.current);
        self.current
    }

    /// Jumps straight to `value` without ramping.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
    }

    /// The value currently held.
    pub fn current(&self) -> f32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_param_round_trips_values() {
        let param = AtomicParam::new(0.5);
        assert_eq!(param.get(), 0.5);
        param.set(-3.25);
        assert_eq!(param.get(), -3.25);
    }

    #[test]
    fn smoother_converges_to_target() {
        let mut smoother = Smoother::new(0.0, 5.0, 48000.0);
        let mut value = 0.0;
        for _ in 0..48000 {
            value = smoother.advance(1.0);
        }
        assert!((value - 1.0).abs() < 1e-3, "got {value}");
    }

    #[test]
    fn zero_time_smoother_is_instant() {
        let mut smoother = Smoother::new(0.0, 0.0, 48000.0);
        assert_eq!(smoother.advance(2.0), 2.0);
    }
}
