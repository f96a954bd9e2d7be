//! Error taxonomy of the host-facing contract.
//!
//! All variants are surfaced to the caller; the core never retries
//! internally.

use thiserror::Error;

/// One-time setup failed. Fatal: no run call is safe afterwards.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("cartridge image is invalid: {0}")]
    InvalidCartridge(anyhow::Error),
}

/// A frame could not be produced.
#[derive(Debug, Error)]
pub enum RunError {
    /// Ordering violation: `initialize` has not completed successfully.
    #[error("console has not been initialized")]
    NotInitialized,

    /// The render target does not match the fixed native output shape.
    #[error("render target is {width}x{height}, expected {expected}x{expected}")]
    IncompatibleTarget {
        width: u32,
        height: u32,
        expected: u32,
    },

    /// The console was stopped via [crate::Console::stop].
    #[error("console is halted")]
    Halted,

    /// The emulated machine reached an unrecoverable state. The fault is
    /// latched; further run calls fail with [RunError::Halted].
    #[error("emulation fault: {0}")]
    Fault(EmulationFault),
}

/// Unrecoverable internal error of the emulated machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmulationFault {
    /// The main CPU executed STP and can only be revived by reset.
    #[error("main CPU stopped")]
    CpuStopped,

    /// The audio coprocessor executed STP while audio was enabled.
    #[error("audio coprocessor stopped")]
    AcpStopped,
}
