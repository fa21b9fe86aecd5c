//! Affect model: Russell's circumplex extended with Mehrabian's dominance axis.
//!
//! Phases of the arousal cycle push this point around through configured
//! deltas; between transitions it relaxes back toward neutral.

use crate::state::deserialize_safe_f32;
use serde::{Deserialize, Serialize};

/// Continuous valence × arousal × dominance state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    /// Valence: unpleasant/pleasant (-1.0 to 1.0)
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub valence: f32,

    /// Arousal: calm/activated (0.0 to 1.0)
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub arousal: f32,

    /// Dominance: yielding/in control (-1.0 to 1.0)
    #[serde(deserialize_with = "deserialize_safe_f32")]
    pub dominance: f32,
}

impl Default for Affect {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.1,
            dominance: 0.0,
        }
    }
}

impl Affect {
    pub fn new(valence: f32, arousal: f32, dominance: f32) -> Self {
        Self {
            valence: valence.clamp(-1.0, 1.0),
            arousal: arousal.clamp(0.0, 1.0),
            dominance: dominance.clamp(-1.0, 1.0),
        }
    }

    /// Apply a delta and re-clamp.
    pub fn shift(&mut self, delta: &AffectDelta) {
        *self = Self::new(
            self.valence + delta.valence,
            self.arousal + delta.arousal,
            self.dominance + delta.dominance,
        );
    }

    /// Interpolate between two affects
    pub fn lerp(&self, other: &Affect, t: f32) -> Affect {
        let t = t.clamp(0.0, 1.0);
        Affect {
            valence: self.valence + (other.valence - self.valence) * t,
            arousal: self.arousal + (other.arousal - self.arousal) * t,
            dominance: self.dominance + (other.dominance - self.dominance) * t,
        }
    }

    /// Replace NaN/Inf with the resting defaults and clamp to range.
    pub fn normalize(&mut self) {
        let rest = Affect::default();
        *self = Affect::new(
            crate::state::sanitize_f32(self.valence, rest.valence),
            crate::state::sanitize_f32(self.arousal, rest.arousal),
            crate::state::sanitize_f32(self.dominance, rest.dominance),
        );
    }
}

/// Additive change to an [`Affect`], applied when a phase is entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AffectDelta {
    pub valence: f32,
    pub arousal: f32,
    pub dominance: f32,
}

impl AffectDelta {
    pub const fn new(valence: f32, arousal: f32, dominance: f32) -> Self {
        Self {
            valence,
            arousal,
            dominance,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.valence.is_finite() && self.arousal.is_finite() && self.dominance.is_finite()
    }
}
