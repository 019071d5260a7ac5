//! Homeostatic drift: time-gated relaxation of the emotion vector toward
//! its baseline, independent of conversation content.
//!
//! A user returning after a long absence should find the agent closer to
//! its resting disposition, not frozen at its last state. The update is a
//! discrete Ornstein–Uhlenbeck step per elapsed interval:
//!
//! `v(t+1) = v(t) + θ·(baseline − v(t)) + σ·N(0,1)`
//!
//! where θ and σ derive from the user's sensitivity setting. Multiple
//! missed intervals are each simulated — never skipped — so long absences
//! show proportionally larger (but still clamped) drift.

use aura_core::emotion::{EmotionSpace, EmotionVector};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Per-user drift bookkeeping, persisted alongside the emotion vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftState {
    /// Unix timestamp of the last applied drift catch-up.
    /// Monotonically non-decreasing.
    pub last_update: i64,
    /// Scalar in [0, 100] controlling both drift speed/volatility and
    /// reactive-update magnitude.
    pub sensitivity: u8,
}

impl DriftState {
    pub fn new(now: i64, sensitivity: u8) -> Self {
        Self {
            last_update: now,
            sensitivity: sensitivity.min(100),
        }
    }
}

/// θ and σ for one catch-up run. Derived from sensitivity in production;
/// constructed directly in tests (σ = 0 gives deterministic relaxation).
#[derive(Debug, Clone, Copy)]
pub struct DriftParams {
    /// Pull rate toward baseline per interval, in [0, 1].
    pub theta: f64,
    /// Scale of the per-step Gaussian noise term.
    pub sigma: f64,
}

impl DriftParams {
    pub fn from_sensitivity(sensitivity: u8) -> Self {
        let s = sensitivity.min(100) as f64;
        Self {
            theta: s / 100.0,
            sigma: s / 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriftConfig {
    /// Length of one drift interval in seconds.
    pub interval_secs: i64,
    /// Cap on catch-up steps, bounding the loop for pathological gaps
    /// (a multi-year absence must not stall the turn).
    pub max_steps: u32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            max_steps: 720,
        }
    }
}

impl From<&aura_core::config::LimbicConfig> for DriftConfig {
    fn from(cfg: &aura_core::config::LimbicConfig) -> Self {
        Self {
            interval_secs: cfg.interval_secs,
            max_steps: cfg.max_drift_steps,
        }
    }
}

pub struct DriftEngine {
    config: DriftConfig,
}

impl DriftEngine {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    /// Catch up elapsed wall-clock time, mutating `vector` and `state` in
    /// place. Returns the number of simulated steps (0 inside the gating
    /// interval — the expected common case on every turn, not an error).
    ///
    /// `now` is captured once by the caller so the gate cannot race a
    /// concurrent write to the same record.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        vector: &mut EmotionVector,
        state: &mut DriftState,
        space: &EmotionSpace,
        now: i64,
        rng: &mut R,
    ) -> u32 {
        let params = DriftParams::from_sensitivity(state.sensitivity);
        self.advance_with(vector, state, space, now, params, rng)
    }

    /// Catch up with explicit θ/σ. Production goes through [`advance`];
    /// tests pass σ = 0 for deterministic relaxation.
    pub fn advance_with<R: Rng + ?Sized>(
        &self,
        vector: &mut EmotionVector,
        state: &mut DriftState,
        space: &EmotionSpace,
        now: i64,
        params: DriftParams,
        rng: &mut R,
    ) -> u32 {
        if self.config.interval_secs <= 0 {
            return 0;
        }
        let elapsed = now.saturating_sub(state.last_update);
        if elapsed < self.config.interval_secs {
            // Inside the interval: identity, timestamp untouched.
            return 0;
        }

        let steps = (elapsed / self.config.interval_secs).min(self.config.max_steps as i64) as u32;

        let mut values = vector.as_floats();
        for _ in 0..steps {
            for (i, v) in values.iter_mut().enumerate() {
                let noise = if params.sigma > 0.0 {
                    let n: f64 = rng.sample(StandardNormal);
                    n * params.sigma
                } else {
                    0.0
                };
                *v += params.theta * (space.baseline[i] as f64 - *v) + noise;
            }
            space.regime.clamp_floats(&mut values);
        }

        *vector = EmotionVector::from_floats(&values, space);
        state.last_update = now;
        tracing::debug!(steps, "homeostatic drift applied");
        steps
    }
}
