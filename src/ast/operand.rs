//! Operand AST type

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Register side effects of a memory operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Update {
    None,
    PreDecrement,
    PostIncrement,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// The name of an architecturally defined register.
    Register(String),

    /// A literal constant value.
    Immediate(u64),

    /// A memory location.
    ///
    /// With no base register the displacement is an absolute address. A base
    /// register of `rip` or `pc` makes the displacement relative to the end of
    /// the instruction holding the operand.
    Memory {
        base: Option<String>,
        displacement: i64,
        update: Update,
    },

    /// An absolute code address, e.g. the target of a long jump.
    Address(Address),

    /// A PC-relative displacement and the address it resolves to.
    Relative { offset: i64, target: Address },
}

impl Operand {
    pub fn reg(name: &str) -> Self {
        Operand::Register(name.to_string())
    }

    pub fn imm<I>(value: I) -> Self
    where
        u64: From<I>,
    {
        Operand::Immediate(u64::from(value))
    }

    /// An absolutely addressed memory location.
    pub fn mem(address: Address) -> Self {
        Operand::Memory {
            base: None,
            displacement: address as i64,
            update: Update::None,
        }
    }

    /// A memory location at a displacement from a base register.
    pub fn based(base: &str, displacement: i64) -> Self {
        Operand::Memory {
            base: Some(base.to_string()),
            displacement,
            update: Update::None,
        }
    }

    pub fn post_inc(base: &str) -> Self {
        Operand::Memory {
            base: Some(base.to_string()),
            displacement: 0,
            update: Update::PostIncrement,
        }
    }

    pub fn pre_dec(base: &str) -> Self {
        Operand::Memory {
            base: Some(base.to_string()),
            displacement: 0,
            update: Update::PreDecrement,
        }
    }

    pub fn cptr(target: Address) -> Self {
        Operand::Address(target)
    }

    pub fn rel(offset: i64, target: Address) -> Self {
        Operand::Relative { offset, target }
    }

    /// The code address this operand transfers control to, if it names one
    /// statically.
    pub fn target(&self) -> Option<Address> {
        match self {
            Operand::Address(target) => Some(*target),
            Operand::Relative { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn register(&self) -> Option<&str> {
        match self {
            Operand::Register(name) => Some(name),
            _ => None,
        }
    }

    pub fn immediate(&self) -> Option<u64> {
        match self {
            Operand::Immediate(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory { .. })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(name) => write!(f, "{}", name),
            Operand::Immediate(value) => write!(f, "0x{:X}", value),
            Operand::Memory {
                base: None,
                displacement,
                ..
            } => write!(f, "[0x{:X}]", displacement),
            Operand::Memory {
                base: Some(base),
                displacement,
                update,
            } => match (update, displacement) {
                (Update::PreDecrement, _) => write!(f, "-{}", base),
                (Update::PostIncrement, _) => write!(f, "{}+", base),
                (Update::None, 0) => write!(f, "[{}]", base),
                (Update::None, d) if *d < 0 => write!(f, "[{}-0x{:X}]", base, -d),
                (Update::None, d) => write!(f, "[{}+0x{:X}]", base, d),
            },
            Operand::Address(target) => write!(f, "0x{:X}", target),
            Operand::Relative { offset, target } => write!(f, ".{:+} (0x{:X})", offset, target),
        }
    }
}
