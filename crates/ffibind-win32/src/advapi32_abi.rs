//! `advapi32` entry points: `GetUserName`, `GetUserNameA`.
//!
//! The account name comes from `getlogin_r`, falling back to the password
//! entry of the effective uid when the process has no controlling terminal.

#![allow(non_snake_case)]

use std::ffi::{CStr, c_char, c_int};
use std::ptr;

use crate::last_error::{
    self, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_PARAMETER, ERROR_NOT_FOUND, ERROR_SUCCESS,
};

pub const FALSE: c_int = 0;
pub const TRUE: c_int = 1;

unsafe extern "C" {
    fn getlogin_r(buf: *mut c_char, bufsize: usize) -> c_int;
}

/// Scratch size for login names and passwd string storage.
const NAME_BUF_LEN: usize = 1024;

/// Retrieve the current account name (ANSI variant).
///
/// On success writes the NUL-terminated name to `buffer`, stores the number
/// of bytes written including the terminator in `*size`, and returns TRUE.
/// If the name plus terminator does not fit in `*size` bytes, stores the
/// required size, sets `ERROR_INSUFFICIENT_BUFFER` and returns FALSE.
///
/// `size` may be unaligned; callers commonly pass a packed byte buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn advapi32_GetUserNameA(buffer: *mut c_char, size: *mut u32) -> c_int {
    if buffer.is_null() || size.is_null() {
        last_error::set(ERROR_INVALID_PARAMETER);
        return FALSE;
    }

    let Some(name) = current_user_name() else {
        last_error::set(ERROR_NOT_FOUND);
        return FALSE;
    };

    // SAFETY: `size` is non-null; read_unaligned tolerates packed buffers.
    let capacity = unsafe { ptr::read_unaligned(size) } as usize;
    match required_len(&name, capacity) {
        Ok(written) => {
            // SAFETY: caller guarantees `buffer` is writable for `*size`
            // bytes and `written <= *size`.
            unsafe {
                ptr::copy_nonoverlapping(name.as_ptr(), buffer.cast::<u8>(), name.len());
                *buffer.add(name.len()) = 0;
                ptr::write_unaligned(size, written as u32);
            }
            last_error::set(ERROR_SUCCESS);
            TRUE
        }
        Err(required) => {
            // SAFETY: `size` is non-null.
            unsafe { ptr::write_unaligned(size, required as u32) };
            last_error::set(ERROR_INSUFFICIENT_BUFFER);
            FALSE
        }
    }
}

/// Retrieve the current account name. Same contract as [`advapi32_GetUserNameA`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn advapi32_GetUserName(buffer: *mut c_char, size: *mut u32) -> c_int {
    unsafe { advapi32_GetUserNameA(buffer, size) }
}

/// Bytes needed for `name` plus its terminator, if they fit in `capacity`.
///
/// `Err` carries the required size.
fn required_len(name: &[u8], capacity: usize) -> Result<usize, usize> {
    let required = name.len() + 1;
    if required > capacity {
        Err(required)
    } else {
        Ok(required)
    }
}

fn current_user_name() -> Option<Vec<u8>> {
    login_name().or_else(passwd_name).filter(|name| !name.is_empty())
}

fn login_name() -> Option<Vec<u8>> {
    let mut buf = [0 as c_char; NAME_BUF_LEN];
    // SAFETY: buf is valid for NAME_BUF_LEN bytes.
    let rc = unsafe { getlogin_r(buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getlogin_r NUL-terminates on success.
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(name.to_bytes().to_vec())
}

fn passwd_name() -> Option<Vec<u8>> {
    // SAFETY: zeroed passwd is a valid out-parameter; getpwuid_r fills it.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = [0 as c_char; NAME_BUF_LEN];
    let mut result: *mut libc::passwd = ptr::null_mut();
    // SAFETY: all out-pointers are valid for the duration of the call.
    let rc = unsafe {
        libc::getpwuid_r(
            libc::geteuid(),
            &mut pwd,
            buf.as_mut_ptr(),
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return None;
    }
    // SAFETY: pw_name points into `buf` and is NUL-terminated.
    let name = unsafe { CStr::from_ptr(pwd.pw_name) };
    Some(name.to_bytes().to_vec())
}
