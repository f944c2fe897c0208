//! Feature extraction primitives used by the built-in aspects

pub mod reverb;
pub mod spectral;
pub mod temporal;
pub mod tempo;

pub use tempo::Tempogram;
