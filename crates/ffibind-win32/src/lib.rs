//! # ffibind-win32
//!
//! Win32-style `extern "C"` entry points implemented on top of POSIX.
//!
//! Every export is named by its ffibind symbol key (`advapi32_GetUserName`,
//! `kernel32_GetLastError`, ...) so a binding for `("Advapi32", "GetUserName")`
//! finds it in-process. The cdylib build exports the same names for loaders
//! that open it directly.
//!
//! ```text
//! bind("Advapi32", "GetUserName", "pp", "i")
//!   -> key advapi32_GetUserName -> exports() -> advapi32_abi::advapi32_GetUserName
//! ```

#![allow(clippy::missing_safety_doc)]

pub mod advapi32_abi;
pub mod kernel32_abi;
mod last_error;

use ffibind_core::ExportedSymbol;

pub use last_error::{
    ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_PARAMETER, ERROR_NOT_FOUND, ERROR_SUCCESS,
};

/// Every entry point this crate publishes.
#[must_use]
pub fn exports() -> Vec<ExportedSymbol> {
    vec![
        ExportedSymbol::new(
            "advapi32_GetUserName",
            advapi32_abi::advapi32_GetUserName as usize,
        ),
        ExportedSymbol::new(
            "advapi32_GetUserNameA",
            advapi32_abi::advapi32_GetUserNameA as usize,
        ),
        ExportedSymbol::new(
            "kernel32_GetLastError",
            kernel32_abi::kernel32_GetLastError as usize,
        ),
        ExportedSymbol::new(
            "kernel32_SetLastError",
            kernel32_abi::kernel32_SetLastError as usize,
        ),
        ExportedSymbol::new(
            "kernel32_RtlZeroMemory",
            kernel32_abi::kernel32_RtlZeroMemory as usize,
        ),
    ]
}
