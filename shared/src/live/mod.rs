//! Live dashboard protocol types

pub mod ws;

pub use ws::*;
