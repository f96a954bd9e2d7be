//! Traits and types used by all components of the emulator.

pub mod clock;
pub mod image;
pub mod logging;
