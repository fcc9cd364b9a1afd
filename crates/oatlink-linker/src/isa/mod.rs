//! Instruction set strategies.
//!
//! The patcher never looks at instruction encodings. Everything it needs
//! from a target goes through [`IsaStrategy`].

mod synthetic;


pub use synthetic::{IsaKind, IsaLimits, SyntheticIsa, TRAP_FILL};

use crate::method::LinkerPatch;
use crate::thunk::{ThunkKey, ThunkType};

/// Target-specific operations the patcher depends on.
pub trait IsaStrategy {
    /// Thunk key for a Baker read barrier branch patch.
    fn baker_read_barrier_key(&self, patch: &LinkerPatch) -> ThunkKey;

    /// Machine code of the thunk identified by `key`.
    fn compile_thunk(&self, key: &ThunkKey) -> Vec<u8>;

    /// Farthest forward distance a branch to a thunk of this type can reach.
    fn max_positive_displacement(&self, thunk_type: ThunkType) -> u32;

    /// Farthest backward distance a branch to a thunk of this type can reach.
    fn max_negative_displacement(&self, thunk_type: ThunkType) -> u32;

    /// Word stored at a call patch for `displacement`.
    fn encode_call_displacement(&self, displacement: u32) -> u32 {
        displacement
    }
}
