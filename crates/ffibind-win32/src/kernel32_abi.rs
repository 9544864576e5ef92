//! `kernel32` entry points: last-error slot and `RtlZeroMemory`.

#![allow(non_snake_case)]

use std::ffi::{c_long, c_void};

use crate::last_error;

/// Last error code set by a shim function on the calling thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kernel32_GetLastError() -> u32 {
    last_error::get()
}

/// Overwrite the calling thread's last error code.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kernel32_SetLastError(code: u32) {
    last_error::set(code);
}

/// Zero `len` bytes at `ptr`. Null pointers and non-positive lengths are
/// no-ops.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kernel32_RtlZeroMemory(ptr: *mut c_void, len: c_long) {
    let Ok(len) = usize::try_from(len) else {
        return;
    };
    if ptr.is_null() || len == 0 {
        return;
    }
    // SAFETY: caller guarantees `ptr` is writable for `len` bytes.
    unsafe { std::ptr::write_bytes(ptr.cast::<u8>(), 0, len) };
}
