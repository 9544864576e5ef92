//! Reports and setup behind the `ffibind` command line.

use ffibind_abi::{Binder, BindingSpec, DynamicLinker, log_sink};
use ffibind_core::config::{self, LinkMode, LogTarget};
use ffibind_core::structured_log::LogEmitter;
use ffibind_core::{BindError, SymbolKey, TypeCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot open log {path}: {source}")]
    Log {
        path: String,
        source: std::io::Error,
    },
}

/// Apply command-line overrides of the environment configuration.
///
/// Must run before the first bind: the process-wide linker reads the link
/// mode once.
pub fn configure(link_mode: Option<&str>, log: Option<&str>) -> Result<(), HarnessError> {
    if let Some(mode) = link_mode {
        config::set_link_mode(LinkMode::from_str_loose(mode));
    }
    if let Some(target) = log.and_then(LogTarget::parse) {
        log_sink::install(open_log(&target)?);
    }
    Ok(())
}

fn open_log(target: &LogTarget) -> Result<LogEmitter, HarnessError> {
    let run_id = log_sink::run_id();
    match target {
        LogTarget::Stderr => Ok(LogEmitter::to_stderr(&run_id)),
        LogTarget::File(path) => {
            LogEmitter::to_file(path, &run_id).map_err(|source| HarnessError::Log {
                path: path.display().to_string(),
                source,
            })
        }
    }
}

/// Flush the log sink, if any.
pub fn finish() {
    log_sink::uninstall();
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Translated form of a binding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingReport {
    pub library: String,
    pub function: String,
    pub key: SymbolKey,
    pub params: Vec<&'static str>,
    pub ret: &'static str,
    pub compact: String,
    pub signature: String,
}

impl From<&BindingSpec> for BindingReport {
    fn from(spec: &BindingSpec) -> Self {
        Self {
            library: spec.library().to_string(),
            function: spec.function().to_string(),
            key: spec.key().clone(),
            params: spec.params().iter().map(|p| p.abi_name()).collect(),
            ret: spec.ret().abi_name(),
            compact: spec.signature().compact(),
            signature: spec.signature().to_string(),
        }
    }
}

/// Translate a binding request without resolving anything.
pub fn describe(
    library: &str,
    function: &str,
    params: &str,
    ret: &str,
) -> Result<BindingReport, BindError> {
    BindingSpec::new(library, function, params, ret).map(|spec| BindingReport::from(&spec))
}

/// In-process exports visible to a linker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportsReport {
    pub link_mode: &'static str,
    pub exports: Vec<&'static str>,
}

#[must_use]
pub fn exports_report(linker: &DynamicLinker) -> ExportsReport {
    ExportsReport {
        link_mode: linker.mode().as_str(),
        exports: linker.export_names(),
    }
}

/// Account name from the bound `GetUserName`, or `None` when the call fails.
pub fn whoami(binder: &Binder) -> Result<Option<String>, BindError> {
    ffibind_abi::account::user_name(binder)
}

/// Codes accepted by `describe`, for help text.
#[must_use]
pub fn code_vocabulary() -> String {
    [
        TypeCode::Pointer,
        TypeCode::Long,
        TypeCode::Int,
        TypeCode::Void,
    ]
    .iter()
    .map(|code| format!("{}={}", code.symbol(), code.abi_name()))
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_translates_codes() {
        let report = describe("ADVAPI32", "GetUserName", "pp", "i").unwrap();
        assert_eq!(report.key.as_str(), "advapi32_GetUserName");
        assert_eq!(report.params, vec!["pointer", "pointer"]);
        assert_eq!(report.ret, "int");
        assert_eq!(report.compact, "pp>i");
    }

    #[test]
    fn describe_rejects_bad_codes() {
        assert!(matches!(
            describe("a", "b", "p p", "i"),
            Err(BindError::MalformedParamList { position: 1, .. })
        ));
        assert!(matches!(
            describe("a", "b", "", "z"),
            Err(BindError::UnknownTypeCode { .. })
        ));
    }

    #[test]
    fn vocabulary_lists_every_code() {
        let text = code_vocabulary();
        for code in ["p=pointer", "l=long", "i=int", "v=void"] {
            assert!(text.contains(code), "{text}");
        }
    }
}
