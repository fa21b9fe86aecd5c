//! Receptor model: stimulus parameters to activation intensity.
//!
//! Each modality has its own response curve, loosely after the afferent that
//! carries it: C-tactile fibres for slow stroking (log-Gaussian velocity
//! tuning), Pacinian corpuscles for vibration (resonance near 200 Hz),
//! thermoreceptors for temperature (distance from skin temperature).
//! Curves only need to be bounded and monotone where it matters; the shapes
//! are tunable through [`ReceptorConfig`].

use soma_core::config::ReceptorConfig;
use soma_core::state::sanitize_f32;
use soma_core::stimulus::NEUTRAL_SKIN_C;
use soma_core::{Material, Result, Stimulus, Zone};

/// Hill-style saturation: 0 at 0, 0.5 at `half`, approaching 1.
fn saturate(x: f32, half: f32) -> f32 {
    let x = x.max(0.0);
    x / (x + half)
}

/// Gaussian in log space, 1.0 at `center`.
fn log_gaussian(x: f32, center: f32, width: f32) -> f32 {
    let d = (x.max(1e-3) / center).ln();
    (-(d * d) / (2.0 * width * width)).exp()
}

#[derive(Debug, Clone)]
pub struct ReceptorModel {
    config: ReceptorConfig,
}

impl ReceptorModel {
    pub fn new(config: ReceptorConfig) -> Self {
        Self { config }
    }

    /// Thermal distance from skin temperature, saturating at 1.0.
    fn thermal(&self, temperature_c: f32) -> f32 {
        ((temperature_c - NEUTRAL_SKIN_C).abs() / self.config.thermal_span_c).min(1.0)
    }

    fn stroke_curve(&self, pressure: f32, velocity: f32, material: Material, wetness: f32) -> f32 {
        let c = &self.config;
        let tuning = c.stroke_velocity_floor
            + (1.0 - c.stroke_velocity_floor)
                * log_gaussian(velocity, c.stroke_optimal_velocity, c.stroke_velocity_width);
        saturate(pressure, c.stroke_pressure_half)
            * tuning
            * material.texture_gain()
            * (1.0 + c.stroke_wet_gain * wetness.clamp(0.0, 1.0))
    }

    /// Modality response before any zone scaling, in [0, 1].
    pub fn raw_response(&self, stimulus: &Stimulus) -> f32 {
        let c = &self.config;
        let raw = match stimulus {
            Stimulus::Stroke {
                pressure_kpa,
                velocity_cm_s,
                material,
                wetness,
            } => self.stroke_curve(
                *pressure_kpa,
                *velocity_cm_s,
                material.unwrap_or_default(),
                wetness.unwrap_or(0.0),
            ),
            Stimulus::Vibration {
                frequency_hz,
                amplitude,
            } => {
                amplitude.clamp(0.0, 1.0)
                    * log_gaussian(*frequency_hz, c.vibration_optimal_hz, c.vibration_width)
            }
            Stimulus::Temperature {
                temperature_c,
                material,
            } => self.thermal(*temperature_c) * material.unwrap_or_default().conductivity(),
            Stimulus::Pinch {
                pressure_kpa,
                material,
            } => {
                saturate(*pressure_kpa, c.pinch_pressure_half)
                    * material.unwrap_or_default().texture_gain()
            }
            Stimulus::Stretch { strain } => *strain,
            Stimulus::Breath {
                airflow_cm_s,
                humidity_rel,
                temperature_c,
            } => {
                saturate(*airflow_cm_s, c.breath_airflow_half)
                    * (0.5 + 0.5 * humidity_rel.clamp(0.0, 1.0))
                    * (1.0 + 0.5 * self.thermal(*temperature_c))
            }
            Stimulus::Lick {
                pressure_kpa,
                velocity_cm_s,
                wetness,
            } => self.stroke_curve(*pressure_kpa, *velocity_cm_s, Material::Tongue, *wetness),
            Stimulus::Kiss {
                pressure_kpa,
                wetness,
                temperature_c,
            } => {
                saturate(*pressure_kpa, c.kiss_pressure_half)
                    * (0.6 + 0.4 * wetness.unwrap_or(0.0).clamp(0.0, 1.0))
                    * (1.0 + 0.5 * self.thermal(*temperature_c))
            }
        };
        sanitize_f32(raw, 0.0).clamp(0.0, 1.0)
    }

    /// Sensitivity multiplier from trust. Never below `trust_gain_floor`.
    pub fn trust_gain(&self, trust: f32) -> f32 {
        let floor = self.config.trust_gain_floor;
        floor + (1.0 - floor) * trust.clamp(0.0, 1.0)
    }

    /// Activation intensity in [0, 1] for `stimulus` on `zone` at the given trust.
    ///
    /// Fails with `UnknownModality` if the zone has no receptors for the
    /// modality, or `InvalidStimulusParameter` for out-of-range parameters.
    pub fn activate(&self, zone: &Zone, stimulus: &Stimulus, trust: f32) -> Result<f32> {
        let weight = zone.modality_weight(stimulus.modality())?;
        stimulus.validate()?;
        let intensity =
            self.raw_response(stimulus) * zone.sensitivity * weight * self.trust_gain(trust);
        Ok(sanitize_f32(intensity, 0.0).clamp(0.0, 1.0))
    }
}

impl Default for ReceptorModel {
    fn default() -> Self {
        Self::new(ReceptorConfig::default())
    }
}
