//! Report and demo behavior behind the CLI subcommands.

use std::sync::Arc;

use ffibind_abi::{Binder, DynamicLinker, SymbolTable};
use ffibind_core::config::LinkMode;
use ffibind_harness::{describe, exports_report, whoami};

fn shim_linker(mode: LinkMode) -> DynamicLinker {
    let linker = DynamicLinker::new(mode);
    linker.register_exports(ffibind_win32::exports());
    linker
}

#[test]
fn describe_report_serializes_key_and_signature() {
    let report = describe("Advapi32", "GetUserName", "PP", "I").unwrap();
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();

    assert_eq!(json["key"], "advapi32_GetUserName");
    assert_eq!(json["library"], "Advapi32");
    assert_eq!(json["params"], serde_json::json!(["pointer", "pointer"]));
    assert_eq!(json["ret"], "int");
    assert_eq!(json["signature"], "(pointer, pointer) -> int");
}

#[test]
fn describe_treats_n_as_native_int() {
    let report = describe("kernel32", "SetLastError", "n", "v").unwrap();
    assert_eq!(report.compact, "i>v");
}

#[test]
fn exports_report_lists_shim_table() {
    let report = exports_report(&shim_linker(LinkMode::Exports));
    assert_eq!(report.link_mode, "exports");
    for name in [
        "advapi32_GetUserName",
        "advapi32_GetUserNameA",
        "kernel32_GetLastError",
        "kernel32_SetLastError",
        "kernel32_RtlZeroMemory",
    ] {
        assert!(report.exports.contains(&name), "missing {name}");
    }
}

#[test]
fn whoami_binds_once_and_trims() {
    let binder = Binder::new(
        Arc::new(SymbolTable::new()),
        Arc::new(shim_linker(LinkMode::Exports)),
    );
    let first = whoami(&binder).unwrap();
    let second = whoami(&binder).unwrap();
    assert_eq!(first, second);
    assert_eq!(binder.table().resolutions(), 1);
    if let Some(name) = first {
        assert_eq!(name, name.trim());
        assert!(!name.is_empty());
    }
}
