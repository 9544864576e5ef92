//! Binding the in-process win32 shim and real shared libraries through the
//! dynamic linker.

use std::sync::Arc;

use ffibind_abi::{
    BindError, Binder, DynamicLinker, NativeValue, SymbolOrigin, SymbolTable, Value,
};
use ffibind_core::config::LinkMode;
use ffibind_win32::{ERROR_NOT_FOUND, ERROR_SUCCESS};

fn binder(mode: LinkMode) -> Binder {
    let linker = DynamicLinker::new(mode);
    linker.register_exports(ffibind_win32::exports());
    Binder::new(Arc::new(SymbolTable::new()), Arc::new(linker))
}

#[test]
fn get_user_name_fills_caller_buffer() {
    let binder = binder(LinkMode::Exports);
    let get_user_name = binder.bind("ADVAPI32", "GetUserName", "pp", "i").unwrap();
    let get_last_error = binder.bind("kernel32", "GetLastError", "", "i").unwrap();
    assert_eq!(get_user_name.symbol().origin(), &SymbolOrigin::Export);

    let mut name = vec![0_u8; 257];
    let mut size = 256_u32.to_ne_bytes();
    let ok = unsafe {
        get_user_name.call(&mut [Value::Buffer(&mut name), Value::Buffer(&mut size)])
    }
    .unwrap();
    let last_error = unsafe { get_last_error.call(&mut []) }.unwrap();

    if ok.is_zero() {
        // No account name resolvable in this environment.
        assert_eq!(last_error, NativeValue::Int(ERROR_NOT_FOUND as i32));
        return;
    }
    assert_eq!(ok, NativeValue::Int(1));
    assert_eq!(last_error, NativeValue::Int(ERROR_SUCCESS as i32));

    let written = u32::from_ne_bytes(size) as usize;
    let text = String::from_utf8_lossy(&name[..written]);
    let user = text.trim_end_matches('\0').trim();
    assert!(!user.is_empty());
    assert_eq!(name[written - 1], 0);
}

#[test]
fn null_size_pointer_is_rejected_by_shim() {
    let binder = binder(LinkMode::Exports);
    let get_user_name = binder.bind("advapi32", "GetUserNameA", "pp", "i").unwrap();
    let mut name = vec![0_u8; 16];
    let out = unsafe { get_user_name.call(&mut [Value::Buffer(&mut name), Value::Int(0)]) }
        .unwrap();
    assert_eq!(out, NativeValue::Int(0));
}

#[test]
fn last_error_round_trips_unsigned_codes() {
    let binder = binder(LinkMode::Exports);
    let set = binder.bind("kernel32", "SetLastError", "i", "v").unwrap();
    let get = binder.bind("kernel32", "GetLastError", "", "i").unwrap();

    unsafe { set.call(&mut [Value::from(0xFFFF_FFFF_u32)]) }.unwrap();
    assert_eq!(unsafe { get.call(&mut []) }.unwrap(), NativeValue::Int(-1));

    unsafe { set.call(&mut [Value::Int(5)]) }.unwrap();
    assert_eq!(unsafe { get.call(&mut []) }.unwrap(), NativeValue::Int(5));
}

#[test]
fn zero_memory_through_binding() {
    let binder = binder(LinkMode::Exports);
    let zero = binder.bind("Kernel32", "RtlZeroMemory", "pl", "v").unwrap();

    let mut buf = [0xAB_u8; 8];
    let out = unsafe { zero.call(&mut [Value::Buffer(&mut buf), Value::Int(3)]) }.unwrap();
    assert_eq!(out, NativeValue::Void);
    assert_eq!(buf, [0, 0, 0, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB]);

    // Null destination is a no-op.
    unsafe { zero.call(&mut [Value::Int(0), Value::Int(8)]) }.unwrap();
}

#[test]
fn exports_mode_does_not_fall_back_to_loader() {
    let binder = binder(LinkMode::Exports);
    let err = binder.bind("user32", "MessageBoxA", "ppp", "i").unwrap_err();
    let BindError::SymbolResolutionFailure {
        library, function, ..
    } = err
    else {
        panic!("expected resolution failure");
    };
    assert_eq!(library, "user32");
    assert_eq!(function, "MessageBoxA");
}

#[test]
fn missing_library_fails_to_resolve() {
    let binder = binder(LinkMode::Auto);
    let err = binder
        .bind("ffibind_definitely_missing", "Anything", "", "v")
        .unwrap_err();
    assert!(matches!(err, BindError::SymbolResolutionFailure { .. }));
    assert!(binder.table().is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn loader_resolves_libc_functions() {
    let binder = binder(LinkMode::Loader);
    let abs = binder.bind("libc.so.6", "abs", "i", "i").unwrap();
    assert!(matches!(abs.symbol().origin(), SymbolOrigin::Loader { .. }));
    assert_eq!(unsafe { abs.call(&mut [Value::Int(-42)]) }.unwrap(), NativeValue::Int(42));

    let labs = binder.bind("libc.so.6", "labs", "l", "l").unwrap();
    assert_eq!(
        unsafe { labs.call(&mut [Value::Int(-(1 << 40))]) }.unwrap(),
        NativeValue::Long(1 << 40)
    );
}

#[cfg(target_os = "linux")]
#[test]
fn loader_passes_caller_buffers() {
    let binder = binder(LinkMode::Loader);
    let strlen = binder.bind("libc.so.6", "strlen", "p", "l").unwrap();
    let text = b"hello\0";
    assert_eq!(
        unsafe { strlen.call(&mut [Value::Bytes(text)]) }.unwrap(),
        NativeValue::Long(5)
    );
}

#[test]
fn account_user_name_via_exports() {
    let binder = binder(LinkMode::Exports);
    match ffibind_abi::account::user_name(&binder).unwrap() {
        Some(name) => {
            assert!(!name.is_empty());
            assert!(!name.contains('\0'));
        }
        None => {
            // Shim could not resolve an account here; the binding still exists.
            assert_eq!(binder.table().len(), 1);
        }
    }
}
