//! Zone memory: an exponentially weighted history of intensities and the
//! trust scalar derived from it.
//!
//! Trust is the only way history reaches future sensitivity.

use soma_core::config::MemoryConfig;
use soma_core::ZoneState;

#[derive(Debug, Clone)]
pub struct MemoryTrust {
    config: MemoryConfig,
}

impl MemoryTrust {
    pub fn new(config: MemoryConfig) -> Self {
        Self { config }
    }

    pub fn initial_trust(&self) -> f32 {
        self.config.initial_trust
    }

    pub fn activation_retention(&self) -> f32 {
        self.config.activation_retention
    }

    /// Fresh state for a zone touched for the first time.
    pub fn new_zone(&self, now: u64) -> ZoneState {
        ZoneState::new(self.config.initial_trust, now)
    }

    /// Record a stimulus of `intensity` at `now` and return the new trust.
    ///
    /// Inside the comfort band trust grows toward 1. Above the aversive
    /// threshold, or a jump of more than `mismatch_margin` over what the zone
    /// is used to, it drops by a fixed penalty. Anything else leaves it alone.
    pub fn update(&self, state: &mut ZoneState, intensity: f32, now: u64) -> f32 {
        let c = &self.config;
        let intensity = intensity.clamp(0.0, 1.0);
        let mismatch = intensity - state.accumulator > c.mismatch_margin;
        state.accumulator = c.ewma_alpha * intensity + (1.0 - c.ewma_alpha) * state.accumulator;

        if intensity > c.aversive_threshold || mismatch {
            tracing::warn!(intensity, trust = state.trust, mismatch, "aversive spike");
            state.trust -= c.aversive_penalty;
        } else if intensity >= c.comfort_low && intensity <= c.comfort_high {
            state.trust += c.trust_gain_rate * (1.0 - state.trust);
        }

        state.last_stimulated = now;
        state.stimulations = state.stimulations.saturating_add(1);
        state.normalize();
        state.trust
    }

    /// Silence decay for a zone not stimulated at `now`.
    ///
    /// After the grace period trust moves toward the floor. It never
    /// increases, and a zone already at or below the floor is left alone.
    pub fn decay_idle(&self, state: &mut ZoneState, now: u64) -> f32 {
        let c = &self.config;
        if state.age(now) > c.silence_grace_steps && state.trust > c.trust_floor {
            state.trust = c.trust_floor + (state.trust - c.trust_floor) * (1.0 - c.silence_decay_rate);
        }
        state.trust
    }
}

impl Default for MemoryTrust {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}
