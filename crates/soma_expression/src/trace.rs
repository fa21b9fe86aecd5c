//! Human-readable state trace for terminals.

use soma_core::{ArousalState, ZoneState};
use std::collections::BTreeMap;

const BAR_WIDTH: usize = 5;

/// Scale a value in [0, 1] to a block bar.
fn bar(x: f32) -> String {
    let n = (x.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    format!("{}{}", "█".repeat(n), "░".repeat(BAR_WIDTH - n))
}

/// Bar for a value in [-1, 1].
fn signed_bar(x: f32) -> String {
    bar((x + 1.0) / 2.0)
}

/// Bar chart of the arousal state plus the `top` most active zones.
pub fn glyphbar(arousal: &ArousalState, zones: &BTreeMap<String, ZoneState>, top: usize) -> String {
    let a = &arousal.affect;
    let mut lines = vec![
        format!(
            "phase:{} ({} steps) | score {} {:.2}",
            arousal.phase,
            arousal.steps_in_phase,
            bar(arousal.score),
            arousal.score
        ),
        format!(
            "valence {} {:+.2} | arousal {} {:.2} | dominance {} {:+.2}",
            signed_bar(a.valence),
            a.valence,
            bar(a.arousal),
            a.arousal,
            signed_bar(a.dominance),
            a.dominance
        ),
    ];
    if arousal.refractory_remaining > 0 {
        lines.push(format!("refractory: {} steps", arousal.refractory_remaining));
    }

    let mut active: Vec<(&String, &ZoneState)> =
        zones.iter().filter(|(_, z)| z.activation > 0.0).collect();
    active.sort_by(|x, y| y.1.activation.total_cmp(&x.1.activation));
    for (id, z) in active.into_iter().take(top) {
        lines.push(format!(
            "{}: act {} {:.2} | trust {} {:.2}",
            id,
            bar(z.activation),
            z.activation,
            bar(z.trust),
            z.trust
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_core::Phase;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0.0), "░░░░░");
        assert_eq!(bar(1.0), "█████");
        assert_eq!(bar(0.6), "███░░");
        assert_eq!(bar(7.0), "█████");
        assert_eq!(signed_bar(-1.0), "░░░░░");
    }

    #[test]
    fn test_glyphbar_lists_top_zones() {
        let arousal = ArousalState {
            phase: Phase::Plateau,
            score: 0.62,
            ..Default::default()
        };
        let mut zones = BTreeMap::new();
        for (id, act) in [("groin", 0.8), ("belly", 0.3), ("sternum", 0.1), ("nape", 0.0)] {
            let mut z = ZoneState::new(0.2, 0);
            z.activation = act;
            zones.insert(id.to_string(), z);
        }
        let out = glyphbar(&arousal, &zones, 2);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("phase:plateau"));
        assert!(lines[2].starts_with("groin:"));
        assert!(lines[3].starts_with("belly:"));
        assert_eq!(lines.len(), 4);
    }
}
