//! Stimuli: one tagged variant per modality, each carrying only its own fields.

use crate::error::{Result, SomaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resting skin temperature. Thermal stimuli are measured against it.
pub const NEUTRAL_SKIN_C: f32 = 32.0;

/// Stimulus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Stroke,
    Vibration,
    Temperature,
    Pinch,
    Stretch,
    Breath,
    Lick,
    Kiss,
}

impl Modality {
    pub const ALL: [Modality; 8] = [
        Modality::Stroke,
        Modality::Vibration,
        Modality::Temperature,
        Modality::Pinch,
        Modality::Stretch,
        Modality::Breath,
        Modality::Lick,
        Modality::Kiss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Stroke => "stroke",
            Modality::Vibration => "vibration",
            Modality::Temperature => "temperature",
            Modality::Pinch => "pinch",
            Modality::Stretch => "stretch",
            Modality::Breath => "breath",
            Modality::Lick => "lick",
            Modality::Kiss => "kiss",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = SomaError;

    fn from_str(s: &str) -> Result<Self> {
        Modality::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SomaError::invalid("kind", format!("unknown stimulus kind '{}'", s)))
    }
}

/// Contact material. Affects texture (stroke-like curves) and conductivity (thermal curves).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Skin,
    Tongue,
    Metal,
    Fabric,
    Ice,
    Feather,
    Leather,
}

impl Material {
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Skin => "skin",
            Material::Tongue => "tongue",
            Material::Metal => "metal",
            Material::Fabric => "fabric",
            Material::Ice => "ice",
            Material::Feather => "feather",
            Material::Leather => "leather",
        }
    }

    /// Multiplier on mechanical (stroke/pinch) response.
    pub fn texture_gain(&self) -> f32 {
        match self {
            Material::Skin => 1.0,
            Material::Tongue => 1.15,
            Material::Metal => 0.8,
            Material::Fabric => 0.75,
            Material::Ice => 0.7,
            Material::Feather => 0.9,
            Material::Leather => 0.85,
        }
    }

    /// Multiplier on thermal response.
    pub fn conductivity(&self) -> f32 {
        match self {
            Material::Metal => 1.25,
            Material::Ice => 1.3,
            Material::Fabric => 0.6,
            Material::Feather => 0.4,
            Material::Leather => 0.7,
            Material::Skin | Material::Tongue => 1.0,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = SomaError;

    fn from_str(s: &str) -> Result<Self> {
        let m = match s {
            "skin" => Material::Skin,
            "tongue" => Material::Tongue,
            "metal" => Material::Metal,
            "fabric" => Material::Fabric,
            "ice" => Material::Ice,
            "feather" => Material::Feather,
            "leather" => Material::Leather,
            other => {
                return Err(SomaError::invalid(
                    "material",
                    format!("unknown material '{}'", other),
                ))
            }
        };
        Ok(m)
    }
}

fn default_pressure() -> f32 {
    1.0
}
fn default_velocity() -> f32 {
    3.0
}
fn default_frequency() -> f32 {
    200.0
}
fn default_amplitude() -> f32 {
    0.5
}
fn default_neutral_temp() -> f32 {
    NEUTRAL_SKIN_C
}
fn default_breath_temp() -> f32 {
    34.0
}
fn default_pinch_pressure() -> f32 {
    3.0
}
fn default_strain() -> f32 {
    0.3
}
fn default_airflow() -> f32 {
    10.0
}
fn default_humidity() -> f32 {
    0.6
}
fn default_lick_pressure() -> f32 {
    0.5
}
fn default_lick_velocity() -> f32 {
    2.0
}
fn default_lick_wetness() -> f32 {
    0.8
}
fn default_kiss_pressure() -> f32 {
    0.8
}

/// One stimulus applied to one zone.
///
/// Serialised internally tagged by `kind`, so `{"kind": "breath", "airflow_cm_s": 10.0}`
/// is a complete breath stimulus with default humidity and temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    Stroke {
        #[serde(default = "default_pressure")]
        pressure_kpa: f32,
        #[serde(default = "default_velocity")]
        velocity_cm_s: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material: Option<Material>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wetness: Option<f32>,
    },
    Vibration {
        #[serde(default = "default_frequency")]
        frequency_hz: f32,
        #[serde(default = "default_amplitude")]
        amplitude: f32,
    },
    Temperature {
        #[serde(default = "default_neutral_temp")]
        temperature_c: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material: Option<Material>,
    },
    Pinch {
        #[serde(default = "default_pinch_pressure")]
        pressure_kpa: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        material: Option<Material>,
    },
    Stretch {
        #[serde(default = "default_strain")]
        strain: f32,
    },
    Breath {
        #[serde(default = "default_airflow")]
        airflow_cm_s: f32,
        #[serde(default = "default_humidity")]
        humidity_rel: f32,
        #[serde(default = "default_breath_temp")]
        temperature_c: f32,
    },
    Lick {
        #[serde(default = "default_lick_pressure")]
        pressure_kpa: f32,
        #[serde(default = "default_lick_velocity")]
        velocity_cm_s: f32,
        #[serde(default = "default_lick_wetness")]
        wetness: f32,
    },
    Kiss {
        #[serde(default = "default_kiss_pressure")]
        pressure_kpa: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wetness: Option<f32>,
        #[serde(default = "default_breath_temp")]
        temperature_c: f32,
    },
}

impl Stimulus {
    /// The stimulus with every parameter at its modality default.
    pub fn default_for(modality: Modality) -> Self {
        match modality {
            Modality::Stroke => Stimulus::Stroke {
                pressure_kpa: default_pressure(),
                velocity_cm_s: default_velocity(),
                material: None,
                wetness: None,
            },
            Modality::Vibration => Stimulus::Vibration {
                frequency_hz: default_frequency(),
                amplitude: default_amplitude(),
            },
            Modality::Temperature => Stimulus::Temperature {
                temperature_c: default_neutral_temp(),
                material: None,
            },
            Modality::Pinch => Stimulus::Pinch {
                pressure_kpa: default_pinch_pressure(),
                material: None,
            },
            Modality::Stretch => Stimulus::Stretch {
                strain: default_strain(),
            },
            Modality::Breath => Stimulus::Breath {
                airflow_cm_s: default_airflow(),
                humidity_rel: default_humidity(),
                temperature_c: default_breath_temp(),
            },
            Modality::Lick => Stimulus::Lick {
                pressure_kpa: default_lick_pressure(),
                velocity_cm_s: default_lick_velocity(),
                wetness: default_lick_wetness(),
            },
            Modality::Kiss => Stimulus::Kiss {
                pressure_kpa: default_kiss_pressure(),
                wetness: None,
                temperature_c: default_breath_temp(),
            },
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            Stimulus::Stroke { .. } => Modality::Stroke,
            Stimulus::Vibration { .. } => Modality::Vibration,
            Stimulus::Temperature { .. } => Modality::Temperature,
            Stimulus::Pinch { .. } => Modality::Pinch,
            Stimulus::Stretch { .. } => Modality::Stretch,
            Stimulus::Breath { .. } => Modality::Breath,
            Stimulus::Lick { .. } => Modality::Lick,
            Stimulus::Kiss { .. } => Modality::Kiss,
        }
    }

    /// Contact material, if the stimulus carries one. A lick is always tongue.
    pub fn material(&self) -> Option<Material> {
        match self {
            Stimulus::Stroke { material, .. }
            | Stimulus::Temperature { material, .. }
            | Stimulus::Pinch { material, .. } => *material,
            Stimulus::Lick { .. } => Some(Material::Tongue),
            _ => None,
        }
    }

    /// Wetness in [0, 1], if the stimulus carries one.
    pub fn wetness(&self) -> Option<f32> {
        match self {
            Stimulus::Stroke { wetness, .. } | Stimulus::Kiss { wetness, .. } => *wetness,
            Stimulus::Lick { wetness, .. } => Some(*wetness),
            _ => None,
        }
    }

    /// Contact temperature, for modalities that carry one.
    pub fn temperature_c(&self) -> Option<f32> {
        match self {
            Stimulus::Temperature { temperature_c, .. }
            | Stimulus::Breath { temperature_c, .. }
            | Stimulus::Kiss { temperature_c, .. } => Some(*temperature_c),
            _ => None,
        }
    }

    /// Reject non-finite or out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Stimulus::Stroke {
                pressure_kpa,
                velocity_cm_s,
                wetness,
                ..
            } => {
                check("pressure", *pressure_kpa, 0.0, 50.0)?;
                check("velocity", *velocity_cm_s, 0.0, 100.0)?;
                if let Some(w) = wetness {
                    check("wet", *w, 0.0, 1.0)?;
                }
            }
            Stimulus::Vibration {
                frequency_hz,
                amplitude,
            } => {
                check("frequency", *frequency_hz, 1.0, 1000.0)?;
                check("amplitude", *amplitude, 0.0, 1.0)?;
            }
            Stimulus::Temperature { temperature_c, .. } => {
                check("temp", *temperature_c, -20.0, 80.0)?;
            }
            Stimulus::Pinch { pressure_kpa, .. } => {
                check("pressure", *pressure_kpa, 0.0, 50.0)?;
            }
            Stimulus::Stretch { strain } => {
                check("strain", *strain, 0.0, 1.0)?;
            }
            Stimulus::Breath {
                airflow_cm_s,
                humidity_rel,
                temperature_c,
            } => {
                check("airflow", *airflow_cm_s, 0.0, 500.0)?;
                check("humidity", *humidity_rel, 0.0, 1.0)?;
                check("temp", *temperature_c, -20.0, 80.0)?;
            }
            Stimulus::Lick {
                pressure_kpa,
                velocity_cm_s,
                wetness,
            } => {
                check("pressure", *pressure_kpa, 0.0, 50.0)?;
                check("velocity", *velocity_cm_s, 0.0, 100.0)?;
                check("wet", *wetness, 0.0, 1.0)?;
            }
            Stimulus::Kiss {
                pressure_kpa,
                wetness,
                temperature_c,
            } => {
                check("pressure", *pressure_kpa, 0.0, 50.0)?;
                if let Some(w) = wetness {
                    check("wet", *w, 0.0, 1.0)?;
                }
                check("temp", *temperature_c, -20.0, 80.0)?;
            }
        }
        Ok(())
    }

    /// Set one parameter by its directive key (`pressure`, `wet`, `temp`, ...).
    ///
    /// Keys the modality doesn't use are rejected rather than ignored.
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        let unused = SomaError::invalid(key, format!("not a parameter of {}", self.modality()));
        if key == "material" {
            let parsed: Material = value.parse()?;
            return match self {
                Stimulus::Stroke { material, .. }
                | Stimulus::Temperature { material, .. }
                | Stimulus::Pinch { material, .. } => {
                    *material = Some(parsed);
                    Ok(())
                }
                _ => Err(unused),
            };
        }

        let number: f32 = value.parse().map_err(|_| {
            SomaError::invalid(key, format!("'{}' is not a number", value))
        })?;

        let slot: &mut f32 = match (&mut *self, key) {
            (Stimulus::Stroke { pressure_kpa, .. }, "pressure")
            | (Stimulus::Pinch { pressure_kpa, .. }, "pressure")
            | (Stimulus::Lick { pressure_kpa, .. }, "pressure")
            | (Stimulus::Kiss { pressure_kpa, .. }, "pressure") => pressure_kpa,
            (Stimulus::Stroke { velocity_cm_s, .. }, "velocity")
            | (Stimulus::Lick { velocity_cm_s, .. }, "velocity") => velocity_cm_s,
            (Stimulus::Stroke { wetness, .. }, "wet") | (Stimulus::Kiss { wetness, .. }, "wet") => {
                wetness.insert(number)
            }
            (Stimulus::Lick { wetness, .. }, "wet") => wetness,
            (Stimulus::Vibration { frequency_hz, .. }, "frequency") => frequency_hz,
            (Stimulus::Vibration { amplitude, .. }, "amplitude") => amplitude,
            (Stimulus::Temperature { temperature_c, .. }, "temp")
            | (Stimulus::Breath { temperature_c, .. }, "temp")
            | (Stimulus::Kiss { temperature_c, .. }, "temp") => temperature_c,
            (Stimulus::Stretch { strain }, "strain") => strain,
            (Stimulus::Breath { airflow_cm_s, .. }, "airflow") => airflow_cm_s,
            (Stimulus::Breath { humidity_rel, .. }, "humidity") => humidity_rel,
            _ => return Err(unused),
        };
        *slot = number;
        Ok(())
    }
}

fn check(parameter: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(SomaError::invalid(parameter, "value is not finite"));
    }
    if value < min || value > max {
        return Err(SomaError::invalid(
            parameter,
            format!("{} outside [{}, {}]", value, min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let s: Stimulus = serde_json::from_str(r#"{"kind":"breath","airflow_cm_s":10.0}"#).unwrap();
        match s {
            Stimulus::Breath {
                airflow_cm_s,
                humidity_rel,
                temperature_c,
            } => {
                assert_eq!(airflow_cm_s, 10.0);
                assert_eq!(humidity_rel, 0.6);
                assert_eq!(temperature_c, 34.0);
            }
            other => panic!("Expected breath, got {:?}", other),
        }
    }

    #[test]
    fn test_modality_roundtrip_names() {
        for m in Modality::ALL {
            assert_eq!(m.as_str().parse::<Modality>().unwrap(), m);
            assert_eq!(Stimulus::default_for(m).modality(), m);
        }
        assert!("tickle".parse::<Modality>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        for m in Modality::ALL {
            Stimulus::default_for(m).validate().unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let s = Stimulus::Vibration {
            frequency_hz: 5000.0,
            amplitude: 0.5,
        };
        match s.validate() {
            Err(SomaError::InvalidStimulusParameter { parameter, .. }) => {
                assert_eq!(parameter, "frequency")
            }
            other => panic!("Expected InvalidStimulusParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_nan() {
        let s = Stimulus::Stretch { strain: f32::NAN };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_lick_implies_tongue() {
        let s = Stimulus::default_for(Modality::Lick);
        assert_eq!(s.material(), Some(Material::Tongue));
        assert_eq!(s.wetness(), Some(0.8));
        assert_eq!(Stimulus::default_for(Modality::Breath).material(), None);
    }

    #[test]
    fn test_set_param_optional_fields() {
        let mut s = Stimulus::default_for(Modality::Stroke);
        assert_eq!(s.wetness(), None);
        s.set_param("wet", "0.4").unwrap();
        s.set_param("material", "fabric").unwrap();
        assert_eq!(s.wetness(), Some(0.4));
        assert_eq!(s.material(), Some(Material::Fabric));
    }

    #[test]
    fn test_set_param_rejects_foreign_key() {
        let mut s = Stimulus::default_for(Modality::Breath);
        assert!(s.set_param("pressure", "1.0").is_err());
        assert!(s.set_param("material", "metal").is_err());
        assert!(s.set_param("airflow", "fast").is_err());
    }
}
