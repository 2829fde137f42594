//! Conversion between the primitive arguments the NativeIO C entry points
//! receive (integers, word pairs, raw pointers) and the Rust values the
//! bridge works with, plus the reverse trip for name lists.
//!
//! Function naming convention:
//! - All functions starting with `sc_` are **public APIs** used by the
//!   bridge. Example: `sc_convert_i64_halves`.
//! - All other functions are helpers.
pub mod conv_error;
pub mod datatype_conversion;
pub mod filesystem_helpers;
pub mod name_list;
pub mod path_conversion;

pub use conv_error::*;
pub use datatype_conversion::*;
pub use filesystem_helpers::*;
pub use name_list::*;
pub use path_conversion::*;
