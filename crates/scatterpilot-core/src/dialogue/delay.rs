//! Simulated backend latency.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long the host should pause before showing a reply.
///
/// The engine never sleeps; it only hands out durations. Delays carry no
/// ordering or correctness meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayPolicy {
    /// Reply immediately.
    #[default]
    None,
    /// Uniformly random delay in `[min_ms, max_ms]`.
    Uniform { min_ms: u64, max_ms: u64 },
}

impl DelayPolicy {
    /// Uniform policy; swapped bounds are put back in order.
    pub fn uniform(min_ms: u64, max_ms: u64) -> Self {
        DelayPolicy::Uniform {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, DelayPolicy::None)
    }

    /// Sample the next delay from the thread-local RNG.
    pub fn next_delay(&self) -> Duration {
        self.sample(&mut rand::thread_rng())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            DelayPolicy::None => Duration::ZERO,
            DelayPolicy::Uniform { min_ms, max_ms } => {
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }
}
