//! This file defines constants that are specific to the NativeIO platform.
//!
/// ===== Descriptors =====
///
/// Descriptors at or below this value are never handed out. The low range
/// is left to conventional numbering (stdin, stdout, stderr and whatever the
/// foreign runtime opened before the bridge) so a NativeIO descriptor never
/// collides with one of those. The first descriptor allocated is
/// `LAST_RESERVED_FD + 1`.
pub const LAST_RESERVED_FD: u64 = 100;

/// ===== Wide integers =====
///
/// 2^53. 64-bit offsets and lengths are accepted only strictly inside
/// `(-MAX_SAFE_INTEGER_BOUND, MAX_SAFE_INTEGER_BOUND)`, the range every
/// layer of the stack can represent exactly.
pub const MAX_SAFE_INTEGER_BOUND: i64 = 1 << 53;

/// 2^32, the weight of the high word of a wide integer.
pub const HIGH_WORD_OFFSET: i64 = 1 << 32;

/// ===== File names =====
///
/// Longest file name accepted by the storage backends, in bytes.
pub const MAX_NAME_LEN: usize = 100;

/// Returns true for the characters allowed in a file name (`a-z`, `0-9`
/// and `_`).
pub const fn is_name_char(c: u8) -> bool {
    matches!(c, b'a'..=b'z' | b'0'..=b'9' | b'_')
}
