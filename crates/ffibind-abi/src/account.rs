//! Current account name through a dynamic `GetUserName` binding.

use ffibind_core::{BindError, Value};

use crate::binding::Binder;

/// Size of the name buffer passed to `GetUserName`, terminator included.
pub const NAME_BUFFER_LEN: usize = 257;
/// Capacity reported to `GetUserName` through its in/out size argument.
pub const NAME_CAPACITY: u32 = 256;

/// Bind `Advapi32!GetUserName(pp)i` and return the account name.
///
/// `Ok(None)` means the native call reported failure (returned 0).
pub fn user_name(binder: &Binder) -> Result<Option<String>, BindError> {
    let get_user_name = binder.bind("Advapi32", "GetUserName", ["p", "p"], "i")?;

    let mut name = vec![0_u8; NAME_BUFFER_LEN];
    let mut size = NAME_CAPACITY.to_ne_bytes();
    // SAFETY: GetUserName takes (char *buffer, DWORD *size) and returns BOOL;
    // `name` holds NAME_CAPACITY bytes plus one and `size` is a 4-byte
    // in/out slot.
    let ok = unsafe {
        get_user_name.call(&mut [Value::Buffer(&mut name), Value::Buffer(&mut size)])?
    };
    if ok.is_zero() {
        return Ok(None);
    }
    Ok(Some(trim_name(&name)))
}

/// Text up to the first NUL, without surrounding whitespace.
fn trim_name(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim().to_string()
}
