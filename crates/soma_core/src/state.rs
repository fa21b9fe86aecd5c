//! Session state: per-zone memory and the single arousal state.
//!
//! The engine owns one of each per session. Everything here is plain data
//! with serde derives so a session can be written out and read back in.

use crate::affect::Affect;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Guard against NaN and Infinity in state values.
/// If the value is NaN or Inf, replace with the provided fallback.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in state, resetting to fallback {}", fallback);
        fallback
    }
}

/// Deserialize an f32, mapping `null` (how serde_json writes NaN) and
/// non-finite values to 0.0.
pub fn deserialize_safe_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<f64> = Option::deserialize(deserializer)?;
    Ok(match v {
        Some(x) if x.is_finite() => x as f32,
        _ => 0.0,
    })
}

// =============================================================================
// Phase
// =============================================================================

/// Position in the arousal cycle. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Rest,
    Arousal,
    Plateau,
    Orgasm,
    OrgasmCooldown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Rest => "rest",
            Phase::Arousal => "arousal",
            Phase::Plateau => "plateau",
            Phase::Orgasm => "orgasm",
            Phase::OrgasmCooldown => "orgasm_cooldown",
        }
    }

    /// Ordinal along the rising path, used for ordering checks.
    pub fn rank(&self) -> u8 {
        match self {
            Phase::Rest => 0,
            Phase::Arousal => 1,
            Phase::Plateau => 2,
            Phase::Orgasm => 3,
            Phase::OrgasmCooldown => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete event raised by a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleEvent {
    Orgasm,
}

impl CycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleEvent::Orgasm => "orgasm",
        }
    }
}

// =============================================================================
// Zone state
// =============================================================================

/// Mutable memory of one zone. Created the first time the zone is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Current activation (0.0 - 1.0), decays every step
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub activation: f32,

    /// Exponentially weighted average of past intensities
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub accumulator: f32,

    /// Accumulated comfort (0.0 - 1.0); scales future sensitivity
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub trust: f32,

    /// Session clock value of the last stimulus that reached this zone
    pub last_stimulated: u64,

    /// Number of stimuli (direct or irradiated) received
    pub stimulations: u32,
}

impl ZoneState {
    pub fn new(initial_trust: f32, now: u64) -> Self {
        Self {
            activation: 0.0,
            accumulator: 0.0,
            trust: initial_trust.clamp(0.0, 1.0),
            last_stimulated: now,
            stimulations: 0,
        }
    }

    /// Steps elapsed since this zone was last stimulated.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_stimulated)
    }

    /// Clamp all values to valid ranges
    pub fn normalize(&mut self) {
        self.activation = sanitize_f32(self.activation, 0.0).clamp(0.0, 1.0);
        self.accumulator = sanitize_f32(self.accumulator, 0.0).clamp(0.0, 1.0);
        self.trust = sanitize_f32(self.trust, 0.0).clamp(0.0, 1.0);
    }
}

// =============================================================================
// Arousal state
// =============================================================================

/// The session-wide arousal state machine.
///
/// Only the arousal cycle writes `phase`; callers observe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArousalState {
    pub phase: Phase,

    pub affect: Affect,

    /// Most recent aggregate score (0.0 - 1.0)
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub score: f32,

    /// Steps spent in the current phase
    pub steps_in_phase: u32,

    /// Steps of refractory time left; non-zero only in `OrgasmCooldown`
    pub refractory_remaining: u32,

    /// Consecutive steps at or above the high threshold
    pub high_streak: u32,

    /// Consecutive steps below the low threshold
    pub low_streak: u32,

    /// Event raised by the transition on the latest step, if any
    #[serde(default)]
    pub last_event: Option<CycleEvent>,
}

impl Default for ArousalState {
    fn default() -> Self {
        Self {
            phase: Phase::Rest,
            affect: Affect::default(),
            score: 0.0,
            steps_in_phase: 0,
            refractory_remaining: 0,
            high_streak: 0,
            low_streak: 0,
            last_event: None,
        }
    }
}

impl ArousalState {
    /// Machine-readable snapshot for responses.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase,
            valence: self.affect.valence,
            arousal: self.affect.arousal,
            dominance: self.affect.dominance,
        }
    }

    pub fn normalize(&mut self) {
        self.affect.normalize();
        self.score = sanitize_f32(self.score, 0.0).clamp(0.0, 1.0);
        if self.phase != Phase::OrgasmCooldown {
            self.refractory_remaining = 0;
        }
    }
}

/// Compact view of the arousal state attached to responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: Phase,
    pub valence: f32,
    pub arousal: f32,
    pub dominance: f32,
}

/// A zone reached by the latest step, as the narrator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchedZone {
    pub zone: String,
    pub label: String,
    /// Activation added by this step
    pub intensity: f32,
    /// Trust after this step's update
    pub trust: f32,
    /// True for the zone the stimulus was applied to
    pub primary: bool,
}

// =============================================================================
// Session snapshot
// =============================================================================

/// Everything needed to resume a session in another process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Unix timestamp of when the snapshot was taken
    pub saved_at: i64,
    pub clock: u64,
    pub zones: BTreeMap<String, ZoneState>,
    pub arousal: ArousalState,
}

impl SessionSnapshot {
    /// Snapshot stamped with the current wall-clock time.
    pub fn now(clock: u64, zones: BTreeMap<String, ZoneState>, arousal: ArousalState) -> Self {
        Self {
            saved_at: chrono::Utc::now().timestamp(),
            clock,
            zones,
            arousal,
        }
    }

    /// Sanitize every float after deserialization.
    pub fn normalize(&mut self) {
        for zone in self.zones.values_mut() {
            zone.normalize();
        }
        self.arousal.normalize();
    }
}
