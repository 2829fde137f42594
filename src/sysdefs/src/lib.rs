//! Shared definitions for the NativeIO bridge.
//!
//! Everything that more than one crate needs to agree on lives here: the
//! errno values the bridge speaks, the sentinel every failed call returns,
//! and the platform limits (reserved descriptor range, largest exactly
//! representable integer, file name rules).
pub mod constants;
