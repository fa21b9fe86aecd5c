//! First-order spreading of activation to adjacent zones.

use soma_core::config::IrradiationConfig;
use soma_core::Zone;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct IrradiationSpreader {
    min_delta: f32,
}

impl IrradiationSpreader {
    pub fn new(config: &IrradiationConfig) -> Self {
        Self {
            min_delta: config.min_delta,
        }
    }

    /// Activation added to each neighbor of `zone`.
    ///
    /// One hop only: neighbors of neighbors receive nothing, so cycles in the
    /// adjacency graph cannot feed back. Every delta is below `intensity`
    /// because edge decays are strictly below 1.
    pub fn spread(&self, zone: &Zone, intensity: f32) -> BTreeMap<String, f32> {
        let intensity = intensity.clamp(0.0, 1.0);
        let deltas: BTreeMap<String, f32> = zone
            .neighbors()
            .iter()
            .map(|edge| (edge.zone.clone(), intensity * edge.decay))
            .filter(|(_, delta)| *delta >= self.min_delta && *delta > 0.0)
            .collect();
        tracing::trace!(zone = %zone.id, intensity, neighbors = deltas.len(), "irradiation");
        deltas
    }
}

impl Default for IrradiationSpreader {
    fn default() -> Self {
        Self::new(&IrradiationConfig::default())
    }
}
