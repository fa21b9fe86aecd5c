pub mod affect;
pub mod body;
pub mod config;
pub mod error;
pub mod grammar;
pub mod state;
pub mod stimulus;

pub use affect::{Affect, AffectDelta};
pub use body::{Adjacency, BodyMap, Zone, ZoneConfig};
pub use config::SomaConfig;
pub use error::{Result, SomaError};
pub use grammar::Directive;
pub use state::{
    ArousalState, CycleEvent, Phase, SessionSnapshot, StateSnapshot, TouchedZone, ZoneState,
};
pub use stimulus::{Material, Modality, Stimulus};
