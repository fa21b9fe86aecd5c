//! Arousal cycle: aggregate scoring and the phase state machine.
//!
//! ```text
//! rest -> arousal -> plateau -> orgasm -> orgasm_cooldown -> rest
//!   ^        |          |
//!   +--------+----------+   (one level down after sustained low scores)
//! ```
//!
//! Only [`ArousalCycle::advance`] writes the phase.

use soma_core::config::ArousalConfig;
use soma_core::state::sanitize_f32;
use soma_core::{Affect, ArousalState, BodyMap, CycleEvent, Phase, ZoneState};
use std::collections::BTreeMap;

/// A phase change produced by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    pub event: Option<CycleEvent>,
}

/// Combine per-zone contributions into one score in [0, 1].
///
/// Probabilistic OR: `1 - Π(1 - c_i)`. Adding or raising any contribution
/// never lowers the result.
pub fn combine<I: IntoIterator<Item = f32>>(contributions: I) -> f32 {
    let quiet: f32 = contributions
        .into_iter()
        .map(|c| 1.0 - sanitize_f32(c, 0.0).clamp(0.0, 1.0))
        .product();
    (1.0 - quiet).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ArousalCycle {
    config: ArousalConfig,
}

impl ArousalCycle {
    pub fn new(config: ArousalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArousalConfig {
        &self.config
    }

    /// Weight of a zone last touched `age` steps ago. Halves every half-life.
    pub fn recency(&self, age: u64) -> f32 {
        0.5f32.powf(age as f32 / self.config.recency_half_life_steps)
    }

    /// One zone's share of the score.
    pub fn contribution(&self, activation: f32, arousal_weight: f32, age: u64) -> f32 {
        (activation.clamp(0.0, 1.0) * arousal_weight.clamp(0.0, 1.0) * self.recency(age))
            .clamp(0.0, 1.0)
    }

    /// Aggregate arousal score over every zone with state.
    pub fn aggregate(&self, body: &BodyMap, zones: &BTreeMap<String, ZoneState>, now: u64) -> f32 {
        combine(zones.iter().filter_map(|(id, state)| {
            body.zone(id).map(|zone| {
                self.contribution(state.activation, zone.arousal_weight, state.age(now))
            })
        }))
    }

    fn target(&self, state: &mut ArousalState, score: f32) -> Option<Phase> {
        let c = &self.config;
        match state.phase {
            Phase::Rest => (score >= c.low_threshold).then_some(Phase::Arousal),
            Phase::Arousal => {
                if state.high_streak >= c.plateau_min_steps {
                    Some(Phase::Plateau)
                } else if state.low_streak >= c.regress_steps {
                    Some(Phase::Rest)
                } else {
                    None
                }
            }
            Phase::Plateau => {
                if score >= c.orgasm_threshold {
                    Some(Phase::Orgasm)
                } else if state.low_streak >= c.regress_steps {
                    Some(Phase::Arousal)
                } else {
                    None
                }
            }
            Phase::Orgasm => Some(Phase::OrgasmCooldown),
            Phase::OrgasmCooldown => {
                state.refractory_remaining = state.refractory_remaining.saturating_sub(1);
                (state.refractory_remaining == 0).then_some(Phase::Rest)
            }
        }
    }

    fn enter(&self, state: &mut ArousalState, to: Phase) -> PhaseTransition {
        let from = state.phase;
        state.phase = to;
        state.steps_in_phase = 0;
        state.high_streak = 0;
        state.low_streak = 0;
        state.refractory_remaining = if to == Phase::OrgasmCooldown {
            self.config.refractory_steps
        } else {
            0
        };
        let event = (to == Phase::Orgasm).then_some(CycleEvent::Orgasm);
        state.last_event = event;
        state.affect.shift(self.config.deltas.for_phase(to));
        tracing::info!(from = %from, to = %to, score = state.score, "phase transition");
        PhaseTransition { from, to, event }
    }

    /// Bring a state from outside (a restored snapshot) within what
    /// [`ArousalCycle::advance`] can produce.
    ///
    /// In cooldown the refractory timer is capped at `refractory_steps`. A
    /// timer of zero carries no record of elapsed time, so it restarts in full.
    pub fn settle(&self, state: &mut ArousalState) {
        if state.phase != Phase::OrgasmCooldown {
            state.refractory_remaining = 0;
            return;
        }
        let full = self.config.refractory_steps;
        state.refractory_remaining = match state.refractory_remaining {
            0 => full,
            r => r.min(full),
        };
    }

    /// Feed one aggregate score through the state machine.
    pub fn advance(&self, state: &mut ArousalState, score: f32) -> Option<PhaseTransition> {
        let c = &self.config;
        let score = sanitize_f32(score, 0.0).clamp(0.0, 1.0);
        state.score = score;
        state.last_event = None;

        state.high_streak = if score >= c.high_threshold {
            state.high_streak.saturating_add(1)
        } else {
            0
        };
        state.low_streak = if score < c.low_threshold {
            state.low_streak.saturating_add(1)
        } else {
            0
        };

        let next = self.target(state, score);

        // Between transitions affect drifts: arousal follows the score,
        // valence and dominance relax toward neutral.
        let a = state.affect;
        let followed = a.lerp(&Affect { arousal: score, ..a }, c.affect_rate);
        let neutral = Affect {
            valence: 0.0,
            dominance: 0.0,
            ..followed
        };
        state.affect = followed.lerp(&neutral, c.affect_relax);

        let transition = next.map(|to| self.enter(state, to));
        state.steps_in_phase = state.steps_in_phase.saturating_add(1);
        transition
    }
}

impl Default for ArousalCycle {
    fn default() -> Self {
        Self::new(ArousalConfig::default())
    }
}
