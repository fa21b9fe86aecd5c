//! soma_bench: trajectory simulation tests for long sessions.
//!
//! Validates emergent behavior over many steps:
//! - Sustained stimulation cycles through every phase repeatedly
//! - Refractory length shapes how often the cycle completes
//! - Trust built by gentle repetition fades slowly in silence

use soma_core::{Phase, Stimulus};
use soma_expression::Response;
use soma_limbic::AffectiveEngine;

/// Per-phase step counts, indexed by `Phase::rank`.
pub type PhaseHistogram = [usize; 5];

/// Summary of a simulated run.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub phases: Vec<Phase>,
    pub histogram: PhaseHistogram,
    pub orgasms: usize,
}

impl Trajectory {
    fn record(&mut self, response: &Response, engine: &AffectiveEngine) {
        let phase = engine.session().phase();
        self.phases.push(phase);
        self.histogram[phase.rank() as usize] += 1;
        if response.tags.iter().any(|t| t.key() == "event") {
            self.orgasms += 1;
        }
    }

    /// Steps between the end of each orgasm and the next one.
    pub fn gaps(&self) -> Vec<usize> {
        let hits: Vec<usize> = self
            .phases
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Phase::Orgasm)
            .map(|(i, _)| i)
            .collect();
        hits.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

/// Apply the same stimulus to one zone for `steps` steps.
pub fn simulate(
    engine: &mut AffectiveEngine,
    zone: &str,
    stimulus: &Stimulus,
    steps: usize,
) -> soma_core::Result<Trajectory> {
    let mut trajectory = Trajectory::default();
    for _ in 0..steps {
        let response = engine.step(zone, stimulus)?;
        trajectory.record(&response, engine);
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_core::{Modality, SomaConfig};

    fn engine_with(config: SomaConfig) -> AffectiveEngine {
        AffectiveEngine::new(config).unwrap()
    }

    /// Sustained vibration keeps completing the cycle, each time sitting out
    /// the full refractory period.
    #[test]
    fn test_sustained_stimulation_cycles_repeatedly() {
        let mut engine = engine_with(SomaConfig::default());
        let s = Stimulus::default_for(Modality::Vibration);
        let t = simulate(&mut engine, "groin", &s, 300).unwrap();

        assert!(t.orgasms >= 2, "Expected repeated cycles, got {}", t.orgasms);
        for (phase, count) in [Phase::Rest, Phase::Arousal, Phase::Plateau]
            .iter()
            .map(|p| (p, t.histogram[p.rank() as usize]))
        {
            assert!(count > 0, "{} never visited", phase);
        }
        // orgasm + 20 cooldown steps + at least one rest step
        for gap in t.gaps() {
            assert!(gap >= 22, "Cycle restarted too early: gap {}", gap);
        }
        assert_eq!(t.histogram[Phase::Orgasm.rank() as usize], t.orgasms);
    }

    /// Different refractory lengths produce measurably different cycle rates.
    #[test]
    fn test_refractory_length_sets_cycle_rate() {
        let s = Stimulus::Vibration {
            frequency_hz: 200.0,
            amplitude: 1.0,
        };

        let mut quick = SomaConfig::default();
        quick.arousal.refractory_steps = 5;
        let mut slow = SomaConfig::default();
        slow.arousal.refractory_steps = 40;

        let t_quick = simulate(&mut engine_with(quick), "groin", &s, 300).unwrap();
        let t_slow = simulate(&mut engine_with(slow), "groin", &s, 300).unwrap();

        assert!(
            t_quick.orgasms > t_slow.orgasms,
            "Short refractory should cycle more often: {} vs {}",
            t_quick.orgasms,
            t_slow.orgasms
        );
        let cooldown = Phase::OrgasmCooldown.rank() as usize;
        assert!(t_slow.histogram[cooldown] >= 40 * t_slow.orgasms.saturating_sub(1));
    }

    /// Trust built on the palm survives a short break and fades over a long one,
    /// never dropping below the floor.
    #[test]
    fn test_trust_fades_in_silence() {
        let config = SomaConfig::default();
        let floor = config.memory.trust_floor;
        let mut engine = engine_with(config);

        simulate(&mut engine, "palm_left", &Stimulus::default_for(Modality::Stroke), 60).unwrap();
        let built = engine.session().zone("palm_left").unwrap().trust;
        assert!(built >= 0.7, "Gentle strokes should build trust, got {}", built);

        let elsewhere = Stimulus::default_for(Modality::Stroke);
        simulate(&mut engine, "sole_left", &elsewhere, 5).unwrap();
        let after_grace = engine.session().zone("palm_left").unwrap().trust;
        assert_eq!(after_grace, built, "Trust should hold during the grace period");

        simulate(&mut engine, "sole_left", &elsewhere, 200).unwrap();
        let faded = engine.session().zone("palm_left").unwrap().trust;
        assert!(faded < built, "Trust should fade: {} -> {}", built, faded);
        assert!(faded >= floor, "Trust fell below floor: {}", faded);
    }
}
