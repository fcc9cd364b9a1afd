use std::io;

use oatlink_core::MethodRef;

use crate::patcher::Phase;
use crate::thunk::ThunkKey;

/// Errors raised while linking a batch of methods.
///
/// Every variant aborts the session: no partially linked output is returned.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("method {0} reserved twice")]
    MethodReservedTwice(MethodRef),
    #[error("offset went backwards: {offset:#x} is below {minimum:#x}")]
    OffsetWentBackwards { offset: u32, minimum: u32 },
    #[error("{operation} not allowed in phase {phase:?}")]
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[error(
        "method {method} too large: thunk deadline {deadline:#x} falls before method end {method_end:#x}"
    )]
    MethodTooLarge {
        method: MethodRef,
        deadline: u32,
        method_end: u32,
    },
    #[error("method {method} placed after {offset:#x} runs past the 32-bit offset space")]
    MethodOffsetOverflow { method: MethodRef, offset: u32 },
    #[error("thunk {key} reserved after {offset:#x} runs past the 32-bit offset space")]
    ThunkOffsetOverflow { key: ThunkKey, offset: u32 },
    #[error("call at {patch_offset:#x} targets {target}, which was never placed")]
    UnresolvedCallTarget { patch_offset: u32, target: MethodRef },
    #[error("{kind:?} displacement from {patch_offset:#x} to {target_offset:#x} is out of range")]
    DisplacementOutOfRange {
        kind: crate::ThunkType,
        patch_offset: u32,
        target_offset: u32,
    },
    #[error("no thunk for {0:?}")]
    UnknownThunk(ThunkKey),
    #[error("thunk {key:?} reserved at {offset:#x} was never written")]
    ThunkNotWritten { key: ThunkKey, offset: u32 },
    #[error("out of order write: thunk due at {expected:#x}, writer is at {actual:#x}")]
    OutOfOrderWrite { expected: u32, actual: u32 },
    #[error("patch at {literal_offset:#x} in {method} overruns code of {code_size} bytes")]
    PatchOutOfBounds {
        method: MethodRef,
        literal_offset: u32,
        code_size: usize,
    },
    #[error("invalid read barrier data {custom_value:#x} in {method}")]
    InvalidBakerData { method: MethodRef, custom_value: u32 },
    #[error("method index of {0} does not fit a bss mapping entry")]
    BssIndexTooLarge(MethodRef),
    #[error("code alignment {0} is not a power of two")]
    InvalidAlignment(u32),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
