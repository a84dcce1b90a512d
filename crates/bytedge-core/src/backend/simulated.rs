// ABOUTME: Local stand-in for a chat service: resolves through the rule engine after a random delay.
// ABOUTME: One seedable RNG drives both the delay and the fallback choice.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{Backend, BackendReply};
use crate::error::BackendError;
use crate::rules::RuleEngine;

/// Uniform delay range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    min: Duration,
    max: Duration,
}

impl Latency {
    /// Bounds are swapped if given out of order
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// Answer immediately
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::from_millis(1500, 2500)
    }
}

pub struct SimulatedBackend {
    rules: Arc<RuleEngine>,
    latency: Latency,
    rng: Mutex<StdRng>,
}

impl SimulatedBackend {
    pub fn new(rules: Arc<RuleEngine>, latency: Latency, rng: StdRng) -> Self {
        Self {
            rules,
            latency,
            rng: Mutex::new(rng),
        }
    }

    /// Deterministic when `seed` is set, entropy-seeded otherwise
    pub fn seeded(rules: Arc<RuleEngine>, latency: Latency, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rules, latency, rng)
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn send(&self, message: &str) -> Result<BackendReply, BackendError> {
        let (delay, response) = {
            let mut rng = self.rng.lock().await;
            let delay = self.latency.sample(&mut *rng);
            let response = self.rules.resolve(message, &mut *rng).to_string();
            (delay, response)
        };

        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Simulating backend latency");
            tokio::time::sleep(delay).await;
        }

        Ok(BackendReply::answer(response))
    }
}
