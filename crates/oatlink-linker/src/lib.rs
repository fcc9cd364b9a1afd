#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Relative call patching and thunk placement for compiled method code.
//!
//! Methods are streamed through a [`ThunkPatcher`] in offset order. The patcher
//! defers calls whose targets are not placed yet, and inserts shared thunks
//! wherever a call or a read-barrier branch could otherwise not reach its
//! destination. A second pass writes the thunks and patches the code.
//!
//! The [`bss`] module lays out and compresses the method bss slots referenced
//! by the same code.

pub mod baker;
pub mod bss;
mod config;
mod error;
pub mod isa;
pub mod link;
mod method;
pub mod patcher;
mod provider;
pub mod thunk;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod provider_tests;

pub use config::PatcherConfig;
pub use error::LinkError;
pub use isa::{IsaKind, IsaLimits, IsaStrategy, SyntheticIsa};
pub use link::{LinkPlan, LinkedCode, PlannedMethod, link, link_with_provider, render_report};
pub use method::{CompiledMethod, LinkerPatch, PatchKind};
pub use patcher::{MethodPlacement, Phase, PatcherStats, ThunkPatcher, ThunkPlacement};
pub use provider::MethodOffsetProvider;
pub use thunk::{ThunkKey, ThunkType};
