//! Two-pass relative patching with shared thunks.
//!
//! Reservation pass: methods are streamed through
//! [`ThunkPatcher::reserve_space`] in offset order. Thunks are reserved
//! between methods when their deadline would otherwise pass.
//!
//! Write pass: [`ThunkPatcher::write_thunks`] is called at every gap between
//! methods, and patches are resolved against the thunk copies around them.

mod displacement;
mod thunk_patcher;


pub use displacement::{displacement_in_range, sign_extension_adjust};
pub use thunk_patcher::{
    MethodPlacement, PatcherStats, Phase, ThunkPatcher, ThunkPlacement, UnprocessedMethodCallPatch,
};
