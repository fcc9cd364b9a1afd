//! Invariant checks excluded from coverage reports.
//!
//! These fire on caller-contract violations, never on bad input data.

#![cfg_attr(coverage_nightly, coverage(off))]

/// A typed view was requested from a value holding another variant.
#[track_caller]
pub fn wrong_variant(what: &str, expected: &str, actual: &dyn std::fmt::Debug) -> ! {
    panic!("{what}: expected {expected}, found {actual:?} (dispatch on the type first)")
}

/// A value that must differ from the current state repeated it.
#[track_caller]
pub fn repeated_value(what: &str, value: u32) -> ! {
    panic!("{what}: value {value} repeated (callers must pass distinct values)")
}

/// A value does not fit the field it is stored in.
#[track_caller]
pub fn value_overflow(what: &str, value: u32, max: u32) -> ! {
    panic!("{what}: value {value} exceeds {max}")
}
