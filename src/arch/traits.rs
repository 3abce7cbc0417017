//! Assembler trait

use crate::arch::Result;
use crate::ast::Instruction;
use crate::memory::Buffer;
use crate::Address;

/// The capabilities an architecture must provide in order to be analyzed.
///
/// Implementations are looked up by `id` in the plugin registry when a saved
/// session is restored, so the identity string must stay stable across
/// releases.
pub trait Assembler: Send + Sync {
    /// Stable identity string of this architecture.
    fn id(&self) -> &str;

    /// Decode the instruction starting at `address`.
    ///
    /// The same bytes at the same address must always decode to the same
    /// instruction. Decoding never modifies any analysis state.
    fn decode(&self, buffer: &Buffer, address: Address) -> Result<Instruction>;

    /// Smallest instruction size, in bytes. Also the step taken past an
    /// address that fails to decode.
    fn min_instruction_size(&self) -> usize;

    /// Largest instruction size, in bytes.
    fn max_instruction_size(&self) -> usize;

    /// Whether absolute memory operands live in a separate address space from
    /// code, and so must not produce data references into the listing.
    fn is_harvard(&self) -> bool {
        false
    }
}
