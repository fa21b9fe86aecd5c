//! Affective narrator: turns the state after a step into a short first-person
//! sentence plus an ordered list of `<<key:value>>` tags.
//!
//! The narrator holds no state of its own. The same inputs always give the
//! same text and tags.

use serde::{Serialize, Serializer};
use soma_core::config::NarratorConfig;
use soma_core::stimulus::NEUTRAL_SKIN_C;
use soma_core::{ArousalState, CycleEvent, Material, Modality, Phase, StateSnapshot, Stimulus, TouchedZone};
use std::fmt;

// ============================================================================
// Tags
// ============================================================================

/// Bucketed wetness, as reported in the `wet` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WetLevel {
    /// Exactly 0
    Dry,
    Low,
    Med,
    High,
    /// Exactly 1
    Soaked,
}

impl WetLevel {
    pub fn from_wetness(w: f32) -> Self {
        if w <= 0.0 {
            WetLevel::Dry
        } else if w >= 1.0 {
            WetLevel::Soaked
        } else if w < 1.0 / 3.0 {
            WetLevel::Low
        } else if w < 2.0 / 3.0 {
            WetLevel::Med
        } else {
            WetLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WetLevel::Dry => "0",
            WetLevel::Low => "low",
            WetLevel::Med => "med",
            WetLevel::High => "high",
            WetLevel::Soaked => "1",
        }
    }
}

/// One machine-readable annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Phase(Phase),
    Event(CycleEvent),
    Mode(Modality),
    Material(Material),
    Wet(WetLevel),
}

impl Tag {
    pub fn key(&self) -> &'static str {
        match self {
            Tag::Phase(_) => "phase",
            Tag::Event(_) => "event",
            Tag::Mode(_) => "mode",
            Tag::Material(_) => "material",
            Tag::Wet(_) => "wet",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Tag::Phase(p) => p.as_str(),
            Tag::Event(e) => e.as_str(),
            Tag::Mode(m) => m.as_str(),
            Tag::Material(m) => m.as_str(),
            Tag::Wet(w) => w.as_str(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<<{}:{}>>", self.key(), self.value())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Response
// ============================================================================

/// What a step returns to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub text: String,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateSnapshot>,
}

impl Response {
    /// Text followed by the inline tag tokens.
    pub fn render(&self) -> String {
        let mut out = self.text.clone();
        for tag in &self.tags {
            out.push(' ');
            out.push_str(&tag.to_string());
        }
        out
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Phase reported by the first tag.
    pub fn phase(&self) -> Option<Phase> {
        self.tags.iter().find_map(|t| match t {
            Tag::Phase(p) => Some(*p),
            _ => None,
        })
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Qualitative word for an intensity. Raw numbers never reach the text.
pub fn descriptor(intensity: f32) -> &'static str {
    if intensity < 0.15 {
        "faint"
    } else if intensity < 0.35 {
        "light"
    } else if intensity < 0.6 {
        "clear"
    } else if intensity < 0.85 {
        "strong"
    } else {
        "overwhelming"
    }
}

/// Register chosen from the trust of the stimulated zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Guarded,
    Measured,
    Open,
}

impl Tone {
    pub fn from_trust(trust: f32) -> Self {
        if trust < 0.3 {
            Tone::Guarded
        } else if trust < 0.7 {
            Tone::Measured
        } else {
            Tone::Open
        }
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn sensation(stimulus: &Stimulus, adjective: &str, label: &str) -> String {
    let a = article(adjective);
    match stimulus {
        Stimulus::Stroke { .. } => format!("{a} {adjective} stroke glides along my {label}"),
        Stimulus::Vibration { .. } => format!("{a} {adjective} hum buzzes through my {label}"),
        Stimulus::Temperature { temperature_c, .. } => {
            let quality = if *temperature_c > NEUTRAL_SKIN_C {
                "warmth"
            } else if *temperature_c < NEUTRAL_SKIN_C {
                "coolness"
            } else {
                "touch"
            };
            format!("{a} {adjective} {quality} settles on my {label}")
        }
        Stimulus::Pinch { .. } => format!("{a} {adjective} pinch catches my {label}"),
        Stimulus::Stretch { .. } => format!("{a} {adjective} pull stretches my {label}"),
        Stimulus::Breath { .. } => format!("{a} {adjective} breath drifts across my {label}"),
        Stimulus::Lick { .. } => format!("{a} {adjective} lick slides over my {label}"),
        Stimulus::Kiss { .. } => format!("{a} {adjective} kiss lands on my {label}"),
    }
}

fn phase_clause(state: &ArousalState) -> &'static str {
    if state.last_event == Some(CycleEvent::Orgasm) {
        return "Everything crests at once and I tremble.";
    }
    match state.phase {
        Phase::Rest => "My body stays calm.",
        Phase::Arousal => "Warmth begins to rise in me.",
        Phase::Plateau => "I feel steady and humming.",
        Phase::Orgasm => "Everything crests at once and I tremble.",
        Phase::OrgasmCooldown => "I settle into a slow afterglow.",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Narrator
// ============================================================================

#[derive(Debug, Clone)]
pub struct AffectiveNarrator {
    config: NarratorConfig,
}

impl AffectiveNarrator {
    pub fn new(config: NarratorConfig) -> Self {
        Self { config }
    }

    /// Tags in their fixed order: phase, event, mode, material, wet.
    pub fn tags(&self, state: &ArousalState, stimulus: &Stimulus) -> Vec<Tag> {
        let mut tags = vec![Tag::Phase(state.phase)];
        if let Some(event) = state.last_event {
            tags.push(Tag::Event(event));
        }
        tags.push(Tag::Mode(stimulus.modality()));
        if let Some(material) = stimulus.material() {
            tags.push(Tag::Material(material));
        }
        if let Some(wet) = stimulus.wetness() {
            tags.push(Tag::Wet(WetLevel::from_wetness(wet)));
        }
        tags
    }

    /// Build the response for one step.
    pub fn narrate(
        &self,
        state: &ArousalState,
        stimulus: &Stimulus,
        touched: &[TouchedZone],
    ) -> Response {
        let (label, intensity, trust) = touched
            .iter()
            .find(|z| z.primary)
            .map(|z| (z.label.as_str(), z.intensity, z.trust))
            .unwrap_or(("skin", 0.0, 0.0));

        let tone = Tone::from_trust(trust);
        tracing::trace!(?tone, label, intensity, "narrating step");
        let feeling = sensation(stimulus, descriptor(intensity), label);
        let mut text = match tone {
            Tone::Guarded => format!("I tense a little as {feeling}."),
            Tone::Measured => format!("{}.", capitalize(&feeling)),
            Tone::Open => format!("I lean into it as {feeling}."),
        };

        let spread = touched
            .iter()
            .filter(|z| !z.primary && z.intensity >= self.config.spread_mention)
            .fold(None::<&TouchedZone>, |best, z| match best {
                Some(b) if b.intensity >= z.intensity => Some(b),
                _ => Some(z),
            });
        if let Some(z) = spread {
            text.push_str(&format!(" It spreads toward my {}.", z.label));
        }

        text.push(' ');
        text.push_str(phase_clause(state));

        Response {
            text,
            tags: self.tags(state, stimulus),
            state: self.config.include_snapshot.then(|| state.snapshot()),
        }
    }
}

impl Default for AffectiveNarrator {
    fn default() -> Self {
        Self::new(NarratorConfig::default())
    }
}
