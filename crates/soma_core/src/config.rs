use crate::affect::AffectDelta;
use crate::body::{BodyMap, ZoneConfig};
use crate::error::SomaError;
use crate::state::Phase;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SomaConfig {
    pub receptors: ReceptorConfig,
    pub irradiation: IrradiationConfig,
    pub memory: MemoryConfig,
    pub arousal: ArousalConfig,
    pub narrator: NarratorConfig,
    /// Body zones. Empty means the built-in body.
    pub zones: Vec<ZoneConfig>,
}

impl SomaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SomaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from path; if the file doesn't exist, return defaults with env overrides.
    ///
    /// A file that exists but fails to read or parse is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            tracing::info!("Config file {} not found, using defaults", path.as_ref().display());
            let mut cfg = Self::default();
            cfg.apply_env_overrides();
            return Ok(cfg);
        }
        Self::load(path)
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SOMA_REFRACTORY_STEPS") {
            if let Ok(n) = v.parse() {
                self.arousal.refractory_steps = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_ORGASM_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.arousal.orgasm_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_INCLUDE_SNAPSHOT") {
            if let Ok(b) = v.parse() {
                self.narrator.include_snapshot = b;
            }
        }
    }

    /// The body map this config describes, validated.
    pub fn body_map(&self) -> crate::Result<BodyMap> {
        if self.zones.is_empty() {
            BodyMap::builtin()
        } else {
            BodyMap::from_config(&self.zones)
        }
    }

    /// Check every ordering and range constraint.
    ///
    /// Engines refuse to start on a config that fails here.
    pub fn validate(&self) -> crate::Result<()> {
        self.receptors.validate()?;
        self.irradiation.validate()?;
        self.memory.validate()?;
        self.arousal.validate()?;
        self.narrator.validate()?;
        self.body_map().map(|_| ())
    }
}

fn positive(name: &str, v: f32) -> crate::Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(SomaError::config(format!("{} must be positive, got {}", name, v)))
    }
}

fn unit_rate(name: &str, v: f32) -> crate::Result<()> {
    if v > 0.0 && v <= 1.0 {
        Ok(())
    } else {
        Err(SomaError::config(format!("{} must lie in (0, 1], got {}", name, v)))
    }
}

fn unit(name: &str, v: f32) -> crate::Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(SomaError::config(format!("{} must lie in [0, 1], got {}", name, v)))
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Shape parameters of the modality response curves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceptorConfig {
    /// Pressure (kPa) at which stroke response is half saturated
    pub stroke_pressure_half: f32,
    /// Velocity (cm/s) C-tactile afferents respond to best
    pub stroke_optimal_velocity: f32,
    /// Width of the log-velocity tuning curve
    pub stroke_velocity_width: f32,
    /// Response left at velocities far from the optimum
    pub stroke_velocity_floor: f32,
    pub stroke_wet_gain: f32,
    /// Vibration resonance peak (Pacinian corpuscles)
    pub vibration_optimal_hz: f32,
    pub vibration_width: f32,
    /// Degrees from neutral skin temperature that saturate the thermal response
    pub thermal_span_c: f32,
    pub pinch_pressure_half: f32,
    pub breath_airflow_half: f32,
    pub kiss_pressure_half: f32,
    /// Effective sensitivity at zero trust; full trust gives 1.0
    pub trust_gain_floor: f32,
}

impl Default for ReceptorConfig {
    fn default() -> Self {
        Self {
            stroke_pressure_half: 1.5,
            stroke_optimal_velocity: 3.0,
            stroke_velocity_width: 1.0,
            stroke_velocity_floor: 0.3,
            stroke_wet_gain: 0.3,
            vibration_optimal_hz: 200.0,
            vibration_width: 0.8,
            thermal_span_c: 15.0,
            pinch_pressure_half: 3.0,
            breath_airflow_half: 20.0,
            kiss_pressure_half: 1.0,
            trust_gain_floor: 0.6,
        }
    }
}

impl ReceptorConfig {
    fn validate(&self) -> crate::Result<()> {
        positive("receptors.stroke_pressure_half", self.stroke_pressure_half)?;
        positive("receptors.stroke_optimal_velocity", self.stroke_optimal_velocity)?;
        positive("receptors.stroke_velocity_width", self.stroke_velocity_width)?;
        unit("receptors.stroke_velocity_floor", self.stroke_velocity_floor)?;
        if !(self.stroke_wet_gain.is_finite() && self.stroke_wet_gain >= 0.0) {
            return Err(SomaError::config("receptors.stroke_wet_gain must be non-negative"));
        }
        positive("receptors.vibration_optimal_hz", self.vibration_optimal_hz)?;
        positive("receptors.vibration_width", self.vibration_width)?;
        positive("receptors.thermal_span_c", self.thermal_span_c)?;
        positive("receptors.pinch_pressure_half", self.pinch_pressure_half)?;
        positive("receptors.breath_airflow_half", self.breath_airflow_half)?;
        positive("receptors.kiss_pressure_half", self.kiss_pressure_half)?;
        unit("receptors.trust_gain_floor", self.trust_gain_floor)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IrradiationConfig {
    /// Neighbor deltas below this are dropped
    pub min_delta: f32,
}

impl Default for IrradiationConfig {
    fn default() -> Self {
        Self { min_delta: 0.005 }
    }
}

impl IrradiationConfig {
    fn validate(&self) -> crate::Result<()> {
        if (0.0..1.0).contains(&self.min_delta) {
            Ok(())
        } else {
            Err(SomaError::config(format!(
                "irradiation.min_delta must lie in [0, 1), got {}",
                self.min_delta
            )))
        }
    }
}

/// Zone memory and trust adaptation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    /// Weight of the newest intensity in the accumulator
    pub ewma_alpha: f32,
    /// Lower edge of the comfortable intensity band
    pub comfort_low: f32,
    /// Upper edge of the comfortable intensity band
    pub comfort_high: f32,
    /// Intensities above this are aversive
    pub aversive_threshold: f32,
    /// A jump this far above the zone's accumulated level is aversive too
    pub mismatch_margin: f32,
    pub trust_gain_rate: f32,
    pub aversive_penalty: f32,
    /// Untouched steps before trust starts to decay
    pub silence_grace_steps: u64,
    pub silence_decay_rate: f32,
    /// Trust never decays below this through silence alone
    pub trust_floor: f32,
    /// Trust of a zone the first time it is touched
    pub initial_trust: f32,
    /// Fraction of activation kept from one step to the next
    pub activation_retention: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: 0.3,
            comfort_low: 0.05,
            comfort_high: 0.75,
            aversive_threshold: 0.9,
            mismatch_margin: 0.6,
            trust_gain_rate: 0.05,
            aversive_penalty: 0.15,
            silence_grace_steps: 5,
            silence_decay_rate: 0.02,
            trust_floor: 0.1,
            initial_trust: 0.2,
            activation_retention: 0.6,
        }
    }
}

impl MemoryConfig {
    fn validate(&self) -> crate::Result<()> {
        unit_rate("memory.ewma_alpha", self.ewma_alpha)?;
        unit_rate("memory.trust_gain_rate", self.trust_gain_rate)?;
        unit_rate("memory.aversive_penalty", self.aversive_penalty)?;
        unit_rate("memory.silence_decay_rate", self.silence_decay_rate)?;
        unit_rate("memory.mismatch_margin", self.mismatch_margin)?;
        if !(self.comfort_low >= 0.0
            && self.comfort_low < self.comfort_high
            && self.comfort_high < self.aversive_threshold
            && self.aversive_threshold <= 1.0)
        {
            return Err(SomaError::config(format!(
                "memory bands must satisfy 0 <= comfort_low < comfort_high < aversive_threshold <= 1, got {} / {} / {}",
                self.comfort_low, self.comfort_high, self.aversive_threshold
            )));
        }
        unit("memory.trust_floor", self.trust_floor)?;
        unit("memory.initial_trust", self.initial_trust)?;
        if !(0.0..1.0).contains(&self.activation_retention) {
            return Err(SomaError::config(format!(
                "memory.activation_retention must lie in [0, 1), got {}",
                self.activation_retention
            )));
        }
        Ok(())
    }
}

/// Affect deltas applied when a phase is entered.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseDeltas {
    pub rest: AffectDelta,
    pub arousal: AffectDelta,
    pub plateau: AffectDelta,
    pub orgasm: AffectDelta,
    pub orgasm_cooldown: AffectDelta,
}

impl Default for PhaseDeltas {
    fn default() -> Self {
        Self {
            rest: AffectDelta::new(0.0, -0.1, 0.1),
            arousal: AffectDelta::new(0.1, 0.15, -0.05),
            plateau: AffectDelta::new(0.1, 0.2, -0.1),
            orgasm: AffectDelta::new(0.5, 0.3, -0.3),
            orgasm_cooldown: AffectDelta::new(0.2, -0.4, 0.2),
        }
    }
}

impl PhaseDeltas {
    pub fn for_phase(&self, phase: Phase) -> &AffectDelta {
        match phase {
            Phase::Rest => &self.rest,
            Phase::Arousal => &self.arousal,
            Phase::Plateau => &self.plateau,
            Phase::Orgasm => &self.orgasm,
            Phase::OrgasmCooldown => &self.orgasm_cooldown,
        }
    }
}

/// Thresholds and timing of the arousal cycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArousalConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub orgasm_threshold: f32,
    /// Consecutive steps at or above `high_threshold` before plateau
    pub plateau_min_steps: u32,
    /// Consecutive steps below `low_threshold` before stepping down a phase
    pub regress_steps: u32,
    /// Length of orgasm_cooldown in steps, counting the entry step
    pub refractory_steps: u32,
    /// Age (steps) at which a zone's contribution to the score halves
    pub recency_half_life_steps: f32,
    /// How fast affect.arousal follows the aggregate score
    pub affect_rate: f32,
    /// How fast valence and dominance relax toward neutral
    pub affect_relax: f32,
    pub deltas: PhaseDeltas,
}

impl Default for ArousalConfig {
    fn default() -> Self {
        Self {
            low_threshold: 0.2,
            high_threshold: 0.5,
            orgasm_threshold: 0.85,
            plateau_min_steps: 3,
            regress_steps: 4,
            refractory_steps: 20,
            recency_half_life_steps: 4.0,
            affect_rate: 0.3,
            affect_relax: 0.05,
            deltas: PhaseDeltas::default(),
        }
    }
}

impl ArousalConfig {
    fn validate(&self) -> crate::Result<()> {
        if !(self.low_threshold > 0.0
            && self.low_threshold < self.high_threshold
            && self.high_threshold < self.orgasm_threshold
            && self.orgasm_threshold <= 1.0)
        {
            return Err(SomaError::config(format!(
                "arousal thresholds must satisfy 0 < low < high < orgasm <= 1, got {} / {} / {}",
                self.low_threshold, self.high_threshold, self.orgasm_threshold
            )));
        }
        for (name, steps) in [
            ("arousal.plateau_min_steps", self.plateau_min_steps),
            ("arousal.regress_steps", self.regress_steps),
            ("arousal.refractory_steps", self.refractory_steps),
        ] {
            if steps == 0 {
                return Err(SomaError::config(format!("{} must be at least 1", name)));
            }
        }
        positive("arousal.recency_half_life_steps", self.recency_half_life_steps)?;
        unit("arousal.affect_rate", self.affect_rate)?;
        unit("arousal.affect_relax", self.affect_relax)?;
        let d = &self.deltas;
        if ![d.rest, d.arousal, d.plateau, d.orgasm, d.orgasm_cooldown]
            .iter()
            .all(AffectDelta::is_finite)
        {
            return Err(SomaError::config("arousal.deltas must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarratorConfig {
    /// Attach the state snapshot to every response
    pub include_snapshot: bool,
    /// Neighbor activation needed before the text mentions spreading
    pub spread_mention: f32,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            include_snapshot: true,
            spread_mention: 0.1,
        }
    }
}

impl NarratorConfig {
    fn validate(&self) -> crate::Result<()> {
        unit("narrator.spread_mention", self.spread_mention)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SomaConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.arousal.refractory_steps, 20);
        assert!(cfg.zones.is_empty());
        assert!(cfg.body_map().unwrap().contains("groin"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[arousal]
orgasm_threshold = 0.9
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.arousal.orgasm_threshold, 0.9);
        // Defaults for unspecified fields
        assert_eq!(cfg.arousal.low_threshold, 0.2);
        assert_eq!(cfg.memory.initial_trust, 0.2);
        assert!(cfg.narrator.include_snapshot);
    }

    #[test]
    fn test_parse_zones_and_deltas() {
        let toml_str = r#"
[arousal.deltas.orgasm]
valence = 0.8

[[zones]]
id = "palm"
sensitivity = 0.6
arousal_weight = 0.2
modalities = { stroke = 1.0, temperature = 0.8 }
adjacent = [{ zone = "wrist", decay = 0.4 }]

[[zones]]
id = "wrist"
sensitivity = 0.7
arousal_weight = 0.3
modalities = { stroke = 1.0 }
adjacent = [{ zone = "palm", decay = 0.4 }]
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.arousal.deltas.orgasm.valence, 0.8);
        assert_eq!(cfg.arousal.deltas.orgasm.arousal, 0.0);
        let body = cfg.body_map().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body.get("palm").unwrap().neighbors()[0].zone, "wrist");
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        let mut cfg = SomaConfig::default();
        cfg.arousal.high_threshold = 0.9;
        cfg.arousal.orgasm_threshold = 0.85;
        assert!(matches!(cfg.validate(), Err(SomaError::Configuration(_))));

        let mut cfg = SomaConfig::default();
        cfg.arousal.low_threshold = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_refractory_rejected() {
        let mut cfg = SomaConfig::default();
        cfg.arousal.refractory_steps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_memory_bands_rejected() {
        let mut cfg = SomaConfig::default();
        cfg.memory.comfort_high = 0.95;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.memory.activation_retention = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_zone_reference_rejected() {
        let toml_str = r#"
[[zones]]
id = "palm"
sensitivity = 0.6
arousal_weight = 0.2
modalities = { stroke = 1.0 }
adjacent = [{ zone = "elbow", decay = 0.4 }]
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(cfg.validate(), Err(SomaError::Configuration(_))));
    }

    #[test]
    fn test_deltas_for_phase() {
        let d = PhaseDeltas::default();
        assert!(d.for_phase(Phase::Orgasm).valence > d.for_phase(Phase::Arousal).valence);
        assert!(d.for_phase(Phase::OrgasmCooldown).arousal < 0.0);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("SOMA_REFRACTORY_STEPS", "7");
        std::env::set_var("SOMA_INCLUDE_SNAPSHOT", "false");

        let mut cfg = SomaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.arousal.refractory_steps, 7);
        assert!(!cfg.narrator.include_snapshot);

        std::env::remove_var("SOMA_REFRACTORY_STEPS");
        std::env::remove_var("SOMA_INCLUDE_SNAPSHOT");

        // Part 2: nonexistent path returns defaults
        let cfg = SomaConfig::load_or_default("/nonexistent/soma.toml").unwrap();
        assert_eq!(cfg.arousal.refractory_steps, 20);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = std::env::temp_dir();
        let bad_type = dir.join(format!("soma_bad_type_{}.toml", std::process::id()));
        std::fs::write(&bad_type, "[arousal]\norgasm_threshold = \"very high\"\n").unwrap();
        assert!(SomaConfig::load_or_default(&bad_type).is_err());

        let typo = dir.join(format!("soma_typo_{}.toml", std::process::id()));
        std::fs::write(&typo, "[arousal]\norgasm_treshold = 0.3\n").unwrap();
        let err = SomaConfig::load_or_default(&typo).unwrap_err();
        assert!(format!("{:#}", err).contains("orgasm_treshold"), "{:#}", err);

        let _ = std::fs::remove_file(&bad_type);
        let _ = std::fs::remove_file(&typo);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<SomaConfig>("[narrator]\ninclude_snapshots = false\n").is_err());
        assert!(toml::from_str::<SomaConfig>("[recptors]\n").is_err());
        let zone = r#"
[[zones]]
id = "palm"
sensitivity = 0.6
arousal_weight = 0.2
modalities = { stroke = 1.0 }
adjacent = [{ zone = "palm", decay = 0.4, weight = 1.0 }]
"#;
        assert!(toml::from_str::<SomaConfig>(zone).is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = SomaConfig::load("/nonexistent/soma.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
