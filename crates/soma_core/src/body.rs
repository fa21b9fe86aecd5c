//! Body map: zones, per-modality sensitivity and the adjacency graph.
//!
//! Built once from configuration and never mutated afterwards, so a single
//! map can be shared by any number of sessions.

use crate::error::{Result, SomaError};
use crate::stimulus::Modality;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const BUILTIN_BODY: &str = include_str!("../data/body.toml");

/// One zone as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneConfig {
    pub id: String,
    /// Human-readable name used in narration; defaults to the id with spaces
    #[serde(default)]
    pub label: Option<String>,
    pub sensitivity: f32,
    /// Contribution of this zone to the aggregate arousal score (0.0 - 1.0)
    pub arousal_weight: f32,
    /// Words that refer to this zone in free text
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Modality name -> receptor weight. Missing modalities are unsupported.
    pub modalities: BTreeMap<String, f32>,
    #[serde(default)]
    pub adjacent: Vec<AdjacencyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjacencyConfig {
    pub zone: String,
    pub decay: f32,
}

#[derive(Deserialize)]
struct BodyFile {
    zones: Vec<ZoneConfig>,
}

/// The zones shipped with the crate.
pub fn builtin_zones() -> Vec<ZoneConfig> {
    let file: BodyFile = toml::from_str(BUILTIN_BODY).expect("built-in body map must parse");
    file.zones
}

/// Edge of the adjacency graph, seen from its source zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacency {
    pub zone: String,
    /// Fraction of activation carried across the edge, strictly inside (0, 1)
    pub decay: f32,
}

/// Validated zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub label: String,
    pub sensitivity: f32,
    pub arousal_weight: f32,
    modalities: BTreeMap<Modality, f32>,
    adjacent: Vec<Adjacency>,
}

impl Zone {
    /// Receptor weight for a modality, or `UnknownModality` if the zone has none.
    pub fn modality_weight(&self, modality: Modality) -> Result<f32> {
        self.modalities
            .get(&modality)
            .copied()
            .ok_or_else(|| SomaError::UnknownModality {
                zone: self.id.clone(),
                modality: modality.to_string(),
            })
    }

    pub fn supports(&self, modality: Modality) -> bool {
        self.modalities.contains_key(&modality)
    }

    pub fn modalities(&self) -> impl Iterator<Item = (Modality, f32)> + '_ {
        self.modalities.iter().map(|(m, w)| (*m, *w))
    }

    pub fn neighbors(&self) -> &[Adjacency] {
        &self.adjacent
    }
}

/// Immutable set of zones with id and alias lookup.
#[derive(Debug, Clone)]
pub struct BodyMap {
    zones: Vec<Zone>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
}

impl BodyMap {
    /// The built-in body.
    pub fn builtin() -> Result<Self> {
        Self::from_config(&builtin_zones())
    }

    /// Validate configuration and build the map.
    pub fn from_config(configs: &[ZoneConfig]) -> Result<Self> {
        if configs.is_empty() {
            return Err(SomaError::config("body map has no zones"));
        }

        let mut index = HashMap::with_capacity(configs.len());
        for (i, cfg) in configs.iter().enumerate() {
            if cfg.id.trim().is_empty() {
                return Err(SomaError::config("zone with empty id"));
            }
            if index.insert(cfg.id.clone(), i).is_some() {
                return Err(SomaError::config(format!("duplicate zone id '{}'", cfg.id)));
            }
        }

        let mut zones = Vec::with_capacity(configs.len());
        let mut aliases = HashMap::new();
        for (i, cfg) in configs.iter().enumerate() {
            if !cfg.sensitivity.is_finite() || cfg.sensitivity <= 0.0 {
                return Err(SomaError::config(format!(
                    "zone '{}': sensitivity must be positive, got {}",
                    cfg.id, cfg.sensitivity
                )));
            }
            if !(0.0..=1.0).contains(&cfg.arousal_weight) {
                return Err(SomaError::config(format!(
                    "zone '{}': arousal_weight must lie in [0, 1], got {}",
                    cfg.id, cfg.arousal_weight
                )));
            }

            let mut modalities = BTreeMap::new();
            for (name, weight) in &cfg.modalities {
                let modality: Modality = name.parse().map_err(|_| {
                    SomaError::config(format!("zone '{}': unknown modality '{}'", cfg.id, name))
                })?;
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(SomaError::config(format!(
                        "zone '{}': weight for {} must be non-negative",
                        cfg.id, name
                    )));
                }
                modalities.insert(modality, *weight);
            }
            if modalities.is_empty() {
                return Err(SomaError::config(format!(
                    "zone '{}' supports no modality",
                    cfg.id
                )));
            }

            let mut seen = HashSet::new();
            let mut adjacent = Vec::with_capacity(cfg.adjacent.len());
            for edge in &cfg.adjacent {
                if !index.contains_key(&edge.zone) {
                    return Err(SomaError::config(format!(
                        "zone '{}' is adjacent to unknown zone '{}'",
                        cfg.id, edge.zone
                    )));
                }
                if edge.zone == cfg.id {
                    return Err(SomaError::config(format!(
                        "zone '{}' is adjacent to itself",
                        cfg.id
                    )));
                }
                if !seen.insert(edge.zone.as_str()) {
                    return Err(SomaError::config(format!(
                        "zone '{}' lists neighbor '{}' twice",
                        cfg.id, edge.zone
                    )));
                }
                if !(edge.decay > 0.0 && edge.decay < 1.0) {
                    return Err(SomaError::config(format!(
                        "edge {} -> {}: decay must lie strictly inside (0, 1), got {}",
                        cfg.id, edge.zone, edge.decay
                    )));
                }
                adjacent.push(Adjacency {
                    zone: edge.zone.clone(),
                    decay: edge.decay,
                });
            }

            for alias in &cfg.aliases {
                let key = alias.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                if aliases.insert(key, i).is_some() {
                    return Err(SomaError::config(format!("alias '{}' used twice", alias)));
                }
            }

            zones.push(Zone {
                id: cfg.id.clone(),
                label: cfg
                    .label
                    .clone()
                    .unwrap_or_else(|| cfg.id.replace('_', " ")),
                sensitivity: cfg.sensitivity,
                arousal_weight: cfg.arousal_weight,
                modalities,
                adjacent,
            });
        }

        Ok(Self {
            zones,
            index,
            aliases,
        })
    }

    pub fn zone(&self, id: &str) -> Option<&Zone> {
        self.index.get(id).map(|&i| &self.zones[i])
    }

    /// Like [`BodyMap::zone`] but fails with `UnknownZone`.
    pub fn get(&self, id: &str) -> Result<&Zone> {
        self.zone(id)
            .ok_or_else(|| SomaError::UnknownZone(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Find a zone by id or alias (case-insensitive).
    pub fn resolve(&self, phrase: &str) -> Option<&Zone> {
        let key = phrase.trim().to_lowercase();
        self.zone(&key)
            .or_else(|| self.aliases.get(&key).map(|&i| &self.zones[i]))
    }

    /// All aliases with their zone ids, longest first so multi-word aliases win.
    pub fn aliases(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(alias, &i)| (alias.as_str(), self.zones[i].id.as_str()))
            .collect();
        out.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
