// This file exists to make it easier to vary a single file of constants
// instead of editing each implementation...

pub use sysdefs::constants::LAST_RESERVED_FD;

/// The first descriptor a fresh table hands out.
pub const FIRST_VIRTUAL_FD: u64 = LAST_RESERVED_FD + 1;
