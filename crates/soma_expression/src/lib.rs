mod narrator;
pub mod trace;

pub use narrator::{descriptor, AffectiveNarrator, Response, Tag, Tone, WetLevel};
pub use trace::glyphbar;
