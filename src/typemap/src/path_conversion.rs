//! File name conversion API
//!
//! Names cross the boundary as NUL-terminated UTF-8.  This file turns them
//! into `&str` for the bridge.  Which names are acceptable is storage's
//! business, so nothing here checks the characters.
use crate::conv_error::TypeConvError;
use std::ffi::{c_char, CStr};

/// Reads a NUL-terminated string in place.
///
/// # Safety
/// `cstr` must be non-null and point at a NUL-terminated string that stays
/// valid for `'a`.
pub unsafe fn charstar_to_ruststr<'a>(cstr: *const c_char) -> Result<&'a str, std::str::Utf8Error> {
    // SAFETY: forwarded to the caller.
    unsafe { CStr::from_ptr(cstr) }.to_str()
}

/// `sc_convert_name` decodes the file name argument of open and delete.
///
/// ## Returns:
/// Success: the name, borrowed from caller memory
/// Fail: `NullString` for a null pointer, `Utf8` for undecodable bytes
///
/// # Safety
/// A non-null `name` must point at a NUL-terminated string that stays valid
/// for `'a`.
pub unsafe fn sc_convert_name<'a>(name: *const c_char) -> Result<&'a str, TypeConvError> {
    if name.is_null() {
        return Err(TypeConvError::NullString);
    }
    // SAFETY: non-null, and the caller vouches for the terminator.
    Ok(unsafe { charstar_to_ruststr(name) }?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn decodes_utf8_name() {
        let name = CString::new("test_file").unwrap();
        assert_eq!(unsafe { sc_convert_name(name.as_ptr()) }, Ok("test_file"));
    }

    #[test]
    fn null_name_is_rejected() {
        assert_eq!(
            unsafe { sc_convert_name(std::ptr::null()) },
            Err(TypeConvError::NullString)
        );
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let bytes = [0xC3u8, 0x28, 0];
        let res = unsafe { sc_convert_name(bytes.as_ptr().cast()) };
        assert!(matches!(res, Err(TypeConvError::Utf8(_))));
    }
}
