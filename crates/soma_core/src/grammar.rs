//! Text front-ends that turn a line of input into a `(zone, stimulus)` pair.
//!
//! Three forms are understood:
//! - `kind@zone key=value ...` directives, e.g. `breath@neck_front_left airflow=10 temp=35`
//! - JSON directives, `{"zone": "...", "stimulus": {"kind": "...", ...}}`
//! - free prose ("gently stroke my neck"), matched against a small keyword
//!   lexicon and the body map's aliases

use crate::body::BodyMap;
use crate::error::{Result, SomaError};
use crate::stimulus::{Material, Modality, Stimulus, NEUTRAL_SKIN_C};
use serde::{Deserialize, Serialize};

/// A stimulus addressed to a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub zone: String,
    pub stimulus: Stimulus,
}

/// Parse `kind@zone key=value ...`.
///
/// Only syntax is checked here. Range checks and zone lookup happen when the
/// directive is applied.
pub fn parse_directive(line: &str) -> Result<Directive> {
    let mut parts = line.split_whitespace();
    let head = parts
        .next()
        .ok_or_else(|| SomaError::invalid("kind", "empty directive"))?;
    let (kind, zone) = head
        .split_once('@')
        .ok_or_else(|| SomaError::invalid("zone", format!("expected kind@zone, got '{}'", head)))?;
    if zone.is_empty() {
        return Err(SomaError::invalid("zone", "missing zone after '@'"));
    }

    let modality: Modality = kind.to_lowercase().parse()?;
    let mut stimulus = Stimulus::default_for(modality);
    for pair in parts {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            SomaError::invalid(pair, "expected key=value")
        })?;
        stimulus.set_param(&key.to_lowercase(), value)?;
    }

    Ok(Directive {
        zone: zone.to_string(),
        stimulus,
    })
}

/// Parse a JSON directive.
pub fn parse_json_directive(line: &str) -> Result<Directive> {
    serde_json::from_str(line).map_err(|e| SomaError::invalid("directive", e.to_string()))
}

/// Parse any supported input form.
///
/// Returns `Ok(None)` for prose that names no known zone.
pub fn parse_input(line: &str, body: &BodyMap) -> Result<Option<Directive>> {
    let line = line.trim();
    if line.starts_with('{') {
        return parse_json_directive(line).map(Some);
    }
    let first = line.split_whitespace().next().unwrap_or_default();
    if first.contains('@') {
        return parse_directive(line).map(Some);
    }
    Ok(parse_prose(line, body))
}

// ============================================================================
// Prose lexicon
// ============================================================================

/// Word stems that select a modality. The first matching word in the text wins.
const MODALITY_STEMS: &[(&str, Modality)] = &[
    ("lick", Modality::Lick),
    ("kiss", Modality::Kiss),
    ("breath", Modality::Breath),
    ("blow", Modality::Breath),
    ("exhal", Modality::Breath),
    ("vibrat", Modality::Vibration),
    ("buzz", Modality::Vibration),
    ("pinch", Modality::Pinch),
    ("squeez", Modality::Pinch),
    ("nibbl", Modality::Pinch),
    ("stretch", Modality::Stretch),
    ("pull", Modality::Stretch),
    ("strok", Modality::Stroke),
    ("caress", Modality::Stroke),
    ("touch", Modality::Stroke),
    ("trac", Modality::Stroke),
    ("rub", Modality::Stroke),
    ("massag", Modality::Stroke),
    ("brush", Modality::Stroke),
];

const GENTLE_WORDS: &[&str] = &["gentl", "soft", "tender", "light", "slow", "feather"];
const FIRM_WORDS: &[&str] = &["firm", "strong", "hard", "rough", "deep", "intens"];
const WARM_WORDS: &[&str] = &["warm", "hot", "heat"];
const COLD_WORDS: &[&str] = &["cold", "cool", "chill", "ice", "icy"];

/// Nouns that name what touches the skin.
const MATERIAL_WORDS: &[(&str, Material)] = &[
    ("feather", Material::Feather),
    ("ice", Material::Ice),
    ("icy", Material::Ice),
    ("metal", Material::Metal),
    ("steel", Material::Metal),
    ("silk", Material::Fabric),
    ("fabric", Material::Fabric),
    ("cloth", Material::Fabric),
    ("leather", Material::Leather),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Intensity {
    Gentle,
    Normal,
    Firm,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Endings accepted after a verb stem ("strok" + "ing").
const VERB_ENDINGS: &[&str] = &["", "s", "e", "es", "ed", "ing", "ion", "ions", "or"];
/// Endings accepted after an adjective or noun stem ("gentl" + "y").
const ADJECTIVE_ENDINGS: &[&str] = &[
    "", "s", "e", "y", "ly", "ely", "er", "est", "ness", "ity", "th", "ed", "ing",
];

/// True if `word` is `stem` plus one of `endings`. A doubled final consonant
/// is allowed ("rub" -> "rubbing", "hot" -> "hotter").
fn inflects(word: &str, stem: &str, endings: &[&str]) -> bool {
    let Some(rest) = word.strip_prefix(stem) else {
        return false;
    };
    if endings.contains(&rest) {
        return true;
    }
    match stem.chars().last() {
        Some(last) if rest.len() > 1 && rest.starts_with(last) => {
            endings.contains(&&rest[last.len_utf8()..])
        }
        _ => false,
    }
}

fn has_stem(words: &[String], stems: &[&str]) -> bool {
    words
        .iter()
        .any(|w| stems.iter().any(|s| inflects(w, s, ADJECTIVE_ENDINGS)))
}

/// True if `phrase` occurs in `words` as whole words (a trailing plural `s` is allowed).
fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words.windows(needle.len()).any(|window| {
        window.iter().zip(&needle).all(|(w, n)| {
            w.as_str() == *n || w.strip_suffix('s').is_some_and(|stem| stem == *n)
        })
    })
}

/// Map free text to a directive. `None` when no zone is recognised.
pub fn parse_prose(text: &str, body: &BodyMap) -> Option<Directive> {
    let words = words(text);

    let zone = body
        .aliases()
        .into_iter()
        .find(|(alias, _)| contains_phrase(&words, alias))
        .map(|(_, id)| id.to_string())
        .or_else(|| {
            body.iter()
                .find(|z| words.iter().any(|w| *w == z.id))
                .map(|z| z.id.clone())
        })?;

    let thermal = if has_stem(&words, WARM_WORDS) {
        Some(40.0)
    } else if has_stem(&words, COLD_WORDS) {
        Some(18.0)
    } else {
        None
    };

    let modality = words
        .iter()
        .find_map(|w| {
            MODALITY_STEMS
                .iter()
                .find(|(stem, _)| inflects(w, stem, VERB_ENDINGS))
                .map(|(_, m)| *m)
        })
        .unwrap_or(if thermal.is_some() {
            Modality::Temperature
        } else {
            Modality::Stroke
        });

    let intensity = if has_stem(&words, FIRM_WORDS) {
        Intensity::Firm
    } else if has_stem(&words, GENTLE_WORDS) {
        Intensity::Gentle
    } else {
        Intensity::Normal
    };

    let mut stimulus = Stimulus::default_for(modality);
    apply_intensity(&mut stimulus, intensity);
    if let Some(t) = thermal {
        set_temperature(&mut stimulus, t);
    }
    let named = MATERIAL_WORDS
        .iter()
        .find(|(stem, _)| has_stem(&words, &[*stem]))
        .map(|(_, m)| *m);
    if let Some(named) = named {
        if let Stimulus::Temperature { material, .. }
        | Stimulus::Stroke { material, .. }
        | Stimulus::Pinch { material, .. } = &mut stimulus
        {
            *material = Some(named);
        }
    }
    if has_stem(&words, &["wet"]) {
        if let Stimulus::Stroke { wetness, .. } | Stimulus::Kiss { wetness, .. } = &mut stimulus {
            *wetness = Some(0.7);
        }
    }

    tracing::debug!(zone = %zone, modality = %modality, ?intensity, "prose resolved");
    Some(Directive { zone, stimulus })
}

fn apply_intensity(stimulus: &mut Stimulus, intensity: Intensity) {
    let factor = match intensity {
        Intensity::Gentle => 0.5,
        Intensity::Normal => return,
        Intensity::Firm => 2.0,
    };
    match stimulus {
        Stimulus::Stroke { pressure_kpa, .. }
        | Stimulus::Pinch { pressure_kpa, .. }
        | Stimulus::Lick { pressure_kpa, .. }
        | Stimulus::Kiss { pressure_kpa, .. } => *pressure_kpa *= factor,
        Stimulus::Vibration { amplitude, .. } => *amplitude = (*amplitude * factor).min(1.0),
        Stimulus::Stretch { strain } => *strain = (*strain * factor).min(1.0),
        Stimulus::Breath { airflow_cm_s, .. } => *airflow_cm_s *= factor,
        Stimulus::Temperature { temperature_c, .. } => {
            *temperature_c = NEUTRAL_SKIN_C + (*temperature_c - NEUTRAL_SKIN_C) * factor
        }
    }
}

fn set_temperature(stimulus: &mut Stimulus, t: f32) {
    if let Stimulus::Temperature { temperature_c, .. }
    | Stimulus::Breath { temperature_c, .. }
    | Stimulus::Kiss { temperature_c, .. } = stimulus
    {
        *temperature_c = t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> BodyMap {
        BodyMap::builtin().unwrap()
    }

    #[test]
    fn test_parse_directive_breath() {
        let d = parse_directive("breath@neck_front_left airflow=10 humidity=0.9 temp=35").unwrap();
        assert_eq!(d.zone, "neck_front_left");
        assert_eq!(
            d.stimulus,
            Stimulus::Breath {
                airflow_cm_s: 10.0,
                humidity_rel: 0.9,
                temperature_c: 35.0
            }
        );
    }

    #[test]
    fn test_parse_directive_defaults() {
        let d = parse_directive("Vibration@groin").unwrap();
        assert_eq!(d.stimulus, Stimulus::default_for(Modality::Vibration));
    }

    #[test]
    fn test_parse_directive_errors() {
        match parse_directive("tickle@ear_left") {
            Err(SomaError::InvalidStimulusParameter { parameter, .. }) => {
                assert_eq!(parameter, "kind")
            }
            other => panic!("Expected InvalidStimulusParameter, got {:?}", other),
        }
        assert!(parse_directive("stroke@").is_err());
        assert!(parse_directive("stroke@palm_left airflow=3").is_err());
        assert!(parse_directive("stroke@palm_left pressure=lots").is_err());
        assert!(parse_directive("stroke@palm_left pressure").is_err());
    }

    #[test]
    fn test_parse_json_directive() {
        let d = parse_json_directive(
            r#"{"zone":"lips","stimulus":{"kind":"kiss","wetness":0.5}}"#,
        )
        .unwrap();
        assert_eq!(d.zone, "lips");
        assert_eq!(d.stimulus.wetness(), Some(0.5));
        assert!(parse_json_directive(r#"{"zone":"lips","stimulus":{"kind":"hug"}}"#).is_err());
    }

    #[test]
    fn test_parse_input_dispatch() {
        let b = body();
        assert!(parse_input(r#"{"zone":"lips","stimulus":{"kind":"kiss"}}"#, &b)
            .unwrap()
            .is_some());
        assert!(parse_input("kiss@lips", &b).unwrap().is_some());
        assert!(parse_input("hello there", &b).unwrap().is_none());
    }

    #[test]
    fn test_prose_gentle_stroke_on_neck() {
        let d = parse_prose("gently stroke my neck", &body()).unwrap();
        assert_eq!(d.zone, "neck_front_left");
        match d.stimulus {
            Stimulus::Stroke { pressure_kpa, .. } => assert!(pressure_kpa < 1.0),
            other => panic!("Expected stroke, got {:?}", other),
        }
    }

    #[test]
    fn test_prose_longest_alias_wins() {
        let d = parse_prose("kiss the back of my neck", &body()).unwrap();
        assert_eq!(d.zone, "nape");
        assert_eq!(d.stimulus.modality(), Modality::Kiss);

        let d = parse_prose("rub my lower back", &body()).unwrap();
        assert_eq!(d.zone, "lower_back");
    }

    #[test]
    fn test_prose_warm_breath() {
        let d = parse_prose("blow warm air across my ear", &body()).unwrap();
        assert_eq!(d.zone, "ear_left");
        assert_eq!(d.stimulus.modality(), Modality::Breath);
        assert_eq!(d.stimulus.temperature_c(), Some(40.0));
    }

    #[test]
    fn test_prose_thermal_only() {
        let d = parse_prose("press an ice cube to my wrist", &body()).unwrap();
        assert_eq!(d.zone, "inner_wrist_left");
        assert_eq!(d.stimulus.modality(), Modality::Temperature);
        assert_eq!(d.stimulus.material(), Some(Material::Ice));
        assert_eq!(d.stimulus.temperature_c(), Some(18.0));
    }

    #[test]
    fn test_prose_word_boundaries() {
        // "near" must not match the "ear" alias
        assert!(parse_prose("come near", &body()).is_none());
        let d = parse_prose("hold my hands", &body()).unwrap();
        assert_eq!(d.zone, "palm_left");
    }

    #[test]
    fn test_prose_stems_need_real_endings() {
        let b = body();
        // "hotel" is not hot, "rubber" is not a rub, "track" is not a trace
        let d = parse_prose("a hotel towel on my neck", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Stroke);
        assert_eq!(d.stimulus.temperature_c(), None);

        let d = parse_prose("a rubber ball buzzing on my palm", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Vibration);

        let d = parse_prose("track my jaw", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Stroke);
        assert!(matches!(
            d.stimulus,
            Stimulus::Stroke { pressure_kpa, .. } if pressure_kpa == 1.0
        ));

        // inflected forms still count
        let d = parse_prose("rubbing my belly with hotter hands", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Stroke);
        let d = parse_prose("the vibration on my groin", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Vibration);
        let d = parse_prose("tracing my collarbone", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Stroke);
    }

    #[test]
    fn test_prose_names_materials() {
        let b = body();
        let d = parse_prose("stroke my neck with a feather", &b).unwrap();
        assert_eq!(d.stimulus.material(), Some(Material::Feather));
        match d.stimulus {
            Stimulus::Stroke { pressure_kpa, .. } => assert!(pressure_kpa < 1.0),
            other => panic!("Expected stroke, got {:?}", other),
        }

        let d = parse_prose("drag cold steel across my belly", &b).unwrap();
        assert_eq!(d.stimulus.modality(), Modality::Temperature);
        assert_eq!(d.stimulus.material(), Some(Material::Metal));

        let d = parse_prose("pinch my hip through the silk", &b).unwrap();
        assert_eq!(d.stimulus.material(), Some(Material::Fabric));

        let d = parse_prose("kiss my lips", &b).unwrap();
        assert_eq!(d.stimulus.material(), None);
    }

    #[test]
    fn test_prose_outputs_valid_stimuli() {
        let b = body();
        for text in [
            "firmly squeeze my hip",
            "softly lick my lips",
            "a strong buzz on my groin",
            "stretch my back hard",
            "cold kiss on my cheek",
        ] {
            let d = parse_prose(text, &b).unwrap();
            d.stimulus.validate().unwrap();
        }
    }
}
