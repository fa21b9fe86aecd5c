//! # Soma limbic layer
//!
//! The physiological pipeline behind every step:
//!
//! 1. **Receptors** turn a stimulus on a zone into an activation intensity
//! 2. **Irradiation** spreads a fraction of it to adjacent zones, one hop only
//! 3. **Memory** folds the intensity into each touched zone's history and trust
//! 4. **Cycle** aggregates zone activations into a score and moves the
//!    arousal phase machine
//!
//! [`AffectiveEngine`] runs these in order and hands the result to the
//! narrator.

pub mod cycle;
mod irradiation;
mod receptor;
mod system;
mod trust;

pub use cycle::{combine, ArousalCycle, PhaseTransition};
pub use irradiation::IrradiationSpreader;
pub use receptor::ReceptorModel;
pub use system::{AffectiveEngine, Physiology, Session};
pub use trust::MemoryTrust;
