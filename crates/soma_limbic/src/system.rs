//! The affective engine.
//!
//! [`Physiology`] holds everything fixed at start-up (validated config, body
//! map and the component models) and is shared read-only behind an `Arc`.
//! [`Session`] is the only mutable state. An [`AffectiveEngine`] pairs one of
//! each, and [`AffectiveEngine::step`] is the only way to advance a session.

use crate::cycle::ArousalCycle;
use crate::irradiation::IrradiationSpreader;
use crate::receptor::ReceptorModel;
use crate::trust::MemoryTrust;
use anyhow::Context;
use soma_core::grammar::Directive;
use soma_core::{
    ArousalState, BodyMap, Phase, Result, SessionSnapshot, SomaConfig, SomaError, Stimulus,
    TouchedZone, ZoneState,
};
use soma_expression::{glyphbar, AffectiveNarrator, Response};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Validated configuration and the models built from it.
#[derive(Debug)]
pub struct Physiology {
    config: SomaConfig,
    body: BodyMap,
    receptors: ReceptorModel,
    spreader: IrradiationSpreader,
    memory: MemoryTrust,
    cycle: ArousalCycle,
    narrator: AffectiveNarrator,
}

impl Physiology {
    /// Fails with `Configuration` if any constraint is violated.
    pub fn new(config: SomaConfig) -> Result<Self> {
        config.validate()?;
        let body = config.body_map()?;
        tracing::debug!(zones = body.len(), "physiology ready");
        Ok(Self {
            receptors: ReceptorModel::new(config.receptors.clone()),
            spreader: IrradiationSpreader::new(&config.irradiation),
            memory: MemoryTrust::new(config.memory.clone()),
            cycle: ArousalCycle::new(config.arousal.clone()),
            narrator: AffectiveNarrator::new(config.narrator.clone()),
            body,
            config,
        })
    }

    pub fn config(&self) -> &SomaConfig {
        &self.config
    }

    pub fn body(&self) -> &BodyMap {
        &self.body
    }

    pub fn receptors(&self) -> &ReceptorModel {
        &self.receptors
    }

    pub fn cycle(&self) -> &ArousalCycle {
        &self.cycle
    }

    pub fn narrator(&self) -> &AffectiveNarrator {
        &self.narrator
    }
}

/// Mutable state of one conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    clock: u64,
    zones: BTreeMap<String, ZoneState>,
    arousal: ArousalState,
}

impl Session {
    /// Steps taken so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn zones(&self) -> &BTreeMap<String, ZoneState> {
        &self.zones
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneState> {
        self.zones.get(id)
    }

    pub fn arousal(&self) -> &ArousalState {
        &self.arousal
    }

    pub fn phase(&self) -> Phase {
        self.arousal.phase
    }
}

pub struct AffectiveEngine {
    physiology: Arc<Physiology>,
    session: Session,
}

impl AffectiveEngine {
    /// Build an engine with a fresh session.
    pub fn new(config: SomaConfig) -> Result<Self> {
        Ok(Self::with_physiology(Arc::new(Physiology::new(config)?)))
    }

    /// A new session on top of shared physiology.
    pub fn with_physiology(physiology: Arc<Physiology>) -> Self {
        Self {
            physiology,
            session: Session::default(),
        }
    }

    pub fn physiology(&self) -> &Arc<Physiology> {
        &self.physiology
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Apply `stimulus` to `zone_id` and advance the session by one step.
    ///
    /// Every check runs before anything is written, so an error leaves the
    /// session exactly as it was.
    pub fn step(&mut self, zone_id: &str, stimulus: &Stimulus) -> Result<Response> {
        let phys = &*self.physiology;
        let zone = phys.body.get(zone_id)?;
        let trust = self
            .session
            .zones
            .get(zone_id)
            .map(|z| z.trust)
            .unwrap_or_else(|| phys.memory.initial_trust());
        let intensity = phys.receptors.activate(zone, stimulus, trust)?;
        let deltas = phys.spreader.spread(zone, intensity);

        let session = &mut self.session;
        session.clock += 1;
        let now = session.clock;

        let retention = phys.memory.activation_retention();
        for state in session.zones.values_mut() {
            state.activation *= retention;
        }

        let mut touched = Vec::with_capacity(deltas.len() + 1);
        let primary = session
            .zones
            .entry(zone.id.clone())
            .or_insert_with(|| phys.memory.new_zone(now));
        primary.activation = (primary.activation + intensity).min(1.0);
        touched.push(TouchedZone {
            zone: zone.id.clone(),
            label: zone.label.clone(),
            intensity,
            trust: phys.memory.update(primary, intensity, now),
            primary: true,
        });

        for (id, delta) in &deltas {
            let Some(neighbor) = phys.body.zone(id) else {
                continue;
            };
            let state = session
                .zones
                .entry(id.clone())
                .or_insert_with(|| phys.memory.new_zone(now));
            state.activation = (state.activation + delta).min(1.0);
            touched.push(TouchedZone {
                zone: id.clone(),
                label: neighbor.label.clone(),
                intensity: *delta,
                trust: phys.memory.update(state, *delta, now),
                primary: false,
            });
        }

        for state in session.zones.values_mut() {
            if state.last_stimulated != now {
                phys.memory.decay_idle(state, now);
            }
        }

        let score = phys.cycle.aggregate(&phys.body, &session.zones, now);
        phys.cycle.advance(&mut session.arousal, score);

        tracing::debug!(
            step = now,
            zone = %zone.id,
            modality = %stimulus.modality(),
            intensity,
            score,
            phase = %session.arousal.phase,
            "step"
        );

        Ok(phys.narrator.narrate(&session.arousal, stimulus, &touched))
    }

    /// Step with a parsed directive.
    pub fn apply(&mut self, directive: &Directive) -> Result<Response> {
        self.step(&directive.zone, &directive.stimulus)
    }

    /// Serialisable copy of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::now(
            self.session.clock,
            self.session.zones.clone(),
            self.session.arousal.clone(),
        )
    }

    /// Replace the session with a snapshot.
    ///
    /// Fails with `UnknownZone` if the snapshot names a zone this body doesn't
    /// have; the current session is kept in that case.
    pub fn restore(&mut self, mut snapshot: SessionSnapshot) -> Result<()> {
        if let Some(id) = snapshot
            .zones
            .keys()
            .find(|id| !self.physiology.body.contains(id))
        {
            return Err(SomaError::UnknownZone(id.clone()));
        }
        snapshot.normalize();
        self.physiology.cycle.settle(&mut snapshot.arousal);
        self.session = Session {
            clock: snapshot.clock,
            zones: snapshot.zones,
            arousal: snapshot.arousal,
        };
        tracing::debug!(clock = self.session.clock, phase = %self.session.arousal.phase, "session restored");
        Ok(())
    }

    /// Back to a fresh session.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }

    /// Terminal trace of the session.
    pub fn trace(&self, top: usize) -> String {
        glyphbar(&self.session.arousal, &self.session.zones, top)
    }

    /// Restore a session previously written by [`AffectiveEngine::save_session`].
    pub fn load_session<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read session file: {}", path.as_ref().display())
        })?;
        let snapshot: SessionSnapshot =
            serde_json::from_str(&content).with_context(|| "Failed to parse session JSON")?;
        self.restore(snapshot)?;
        Ok(())
    }

    /// Write the session as JSON.
    pub fn save_session<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path.as_ref(), json).with_context(|| {
            format!("Failed to write session file: {}", path.as_ref().display())
        })?;
        Ok(())
    }
}
