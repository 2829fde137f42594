//! Basic primitive type conversion API
//!
//! This file defines conversion helpers for the integer arguments of the
//! NativeIO entry points: descriptors, buffer lengths and the 64-bit
//! offsets/lengths that arrive split into two 32-bit words.
use crate::conv_error::{RangeError, TypeConvError};
use sysdefs::constants::lind_platform_const::{HIGH_WORD_OFFSET, MAX_SAFE_INTEGER_BOUND};

/// `sc_convert_i64_halves` rebuilds a 64-bit parameter from the two words a
/// 32-bit caller splits it into.
///
/// The high word carries the sign (it is the upper half of a two's
/// complement i64); the low word is always read as unsigned.  The result
/// must lie strictly inside (-2^53, 2^53).  Values at or past either bound
/// are rejected, never clamped: the point is that the value which reaches
/// storage is exactly the one the caller meant.
///
/// ## Arguments:
/// low: the low 32 bits
/// high: the high 32 bits
///
/// ## Returns:
/// Success: the combined value
/// Fail: `RangeError`
pub fn sc_convert_i64_halves(low: u32, high: u32) -> Result<i64, RangeError> {
    // Reinterpret, don't convert: 0xFFFF_FFFF in the high word is -1.
    #[allow(clippy::cast_possible_wrap)]
    let signed_high = i64::from(high as i32);
    // Can't overflow: |signed_high| <= 2^31 and low < 2^32.
    let value = signed_high * HIGH_WORD_OFFSET + i64::from(low);

    // We also check for equality since 2^53 + 1 can't be told apart from
    // 2^53 once it has been through a double.
    if value <= -MAX_SAFE_INTEGER_BOUND || value >= MAX_SAFE_INTEGER_BOUND {
        return Err(RangeError { low, high, value });
    }
    Ok(value)
}

/// Splits a value into the (low, high) word pair `sc_convert_i64_halves`
/// expects.  Used by callers on our side of the boundary.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sc_split_i64(value: i64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

/// Descriptors cross as C ints.  A negative one can't name anything.
pub fn sc_convert_fd(fd: i32) -> Result<u64, TypeConvError> {
    u64::try_from(fd).map_err(|_| TypeConvError::Negative {
        what: "descriptor",
        value: i64::from(fd),
    })
}

/// Buffer lengths cross as C ints.
pub fn sc_convert_buflen(len: i32) -> Result<usize, TypeConvError> {
    usize::try_from(len).map_err(|_| TypeConvError::Negative {
        what: "buffer length",
        value: i64::from(len),
    })
}

/// Offsets and file lengths are signed on the wire but storage addresses
/// bytes from zero.
pub fn sc_convert_offset(value: i64, what: &'static str) -> Result<u64, TypeConvError> {
    u64::try_from(value).map_err(|_| TypeConvError::Negative { what, value })
}
