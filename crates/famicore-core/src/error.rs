//! The console-level error sum.

use famicore_cpu::CpuError;
use famicore_mappers::RomError;

/// Errors surfaced at the console boundary.
///
/// Loading errors come out of [`crate::Console::new`]; the rest are
/// fatal step-loop errors that end the emulation session.
#[derive(Debug, thiserror::Error)]
pub enum EmuError {
    /// The ROM image failed to parse.
    #[error("invalid ROM: {0}")]
    InvalidRom(#[source] RomError),

    /// The ROM parses but names a mapper this core does not implement.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u8),

    /// The CPU fetched an opcode outside the decode table. Fatal.
    #[error(transparent)]
    UnknownOpcode(#[from] CpuError),

    /// Access to an address range with no handler. Fatal.
    #[error("bus fault at ${addr:04X}")]
    BusFault {
        /// The faulting bus address.
        addr: u16,
    },

    /// The frame consumer has gone away; the run loop ends cleanly.
    #[error("frame sink closed")]
    FrameSinkClosed,
}

impl From<RomError> for EmuError {
    fn from(err: RomError) -> Self {
        match err {
            RomError::UnsupportedMapper(id) => Self::UnsupportedMapper(id),
            other => Self::InvalidRom(other),
        }
    }
}
