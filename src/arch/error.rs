//! Error type for instruction decoding

use crate::Address;
use std::result;
use thiserror::Error;

/// Reasons a decoder can refuse an address.
///
/// Both are recoverable: the caller records the address as unexplored and
/// continues at the next candidate address.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No opcode table entry matches the code unit at this address.
    #[error("invalid opcode {unit:#06x} at {address:#x}")]
    InvalidOpcode { address: Address, unit: u64 },

    /// The matched instruction is longer than the bytes left at this address.
    #[error("truncated instruction at {address:#x}: need {needed} bytes, have {available}")]
    TruncatedInstruction {
        address: Address,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    pub fn invalid_opcode(address: Address, unit: u64) -> Self {
        DecodeError::InvalidOpcode { address, unit }
    }

    pub fn truncated(address: Address, needed: usize, available: usize) -> Self {
        DecodeError::TruncatedInstruction {
            address,
            needed,
            available,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            DecodeError::InvalidOpcode { address, .. } => *address,
            DecodeError::TruncatedInstruction { address, .. } => *address,
        }
    }
}

pub type Result<T> = result::Result<T, DecodeError>;
