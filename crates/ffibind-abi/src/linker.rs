//! Symbol resolution: the dynamic-linking facility bindings depend on.
//!
//! [`DynamicLinker`] resolves a [`BindingSpec`] in up to two steps, in the
//! order permitted by its [`LinkMode`]:
//!
//! 1. In-process export tables, keyed by the binding's symbol key
//!    (`advapi32_GetUserName`).
//! 2. The platform loader: the library named by the binding is opened once
//!    (and kept loaded for the process lifetime) and searched for the
//!    function name.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use ffibind_core::config::{self, LinkMode};
use ffibind_core::{BindError, BindingSpec, ExportedSymbol};
use libloading::Library;
use parking_lot::{Mutex, RwLock};

/// Where a resolved symbol came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOrigin {
    /// In-process export table.
    Export,
    /// Library opened through the platform loader.
    Loader { file: String },
    /// Supplied directly by a custom resolver.
    Injected,
}

impl fmt::Display for SymbolOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export => f.write_str("export"),
            Self::Loader { file } => write!(f, "loader:{file}"),
            Self::Injected => f.write_str("injected"),
        }
    }
}

/// A native function address plus whatever keeps it mapped.
#[derive(Debug, Clone)]
pub struct NativeSymbol {
    address: usize,
    origin: SymbolOrigin,
    _library: Option<Arc<Library>>,
}

impl NativeSymbol {
    /// Wrap a raw function address.
    ///
    /// The address must stay valid for the lifetime of the process; the symbol
    /// table never releases attached symbols.
    #[must_use]
    pub fn new(address: usize, origin: SymbolOrigin) -> Self {
        Self {
            address,
            origin,
            _library: None,
        }
    }

    fn from_library(address: usize, file: String, library: Arc<Library>) -> Self {
        Self {
            address,
            origin: SymbolOrigin::Loader { file },
            _library: Some(library),
        }
    }

    #[must_use]
    pub fn address(&self) -> usize {
        self.address
    }

    #[must_use]
    pub fn origin(&self) -> &SymbolOrigin {
        &self.origin
    }
}

/// Resolves the native symbol for a binding.
///
/// Called at most once per symbol key by the symbol table, under its lock.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, spec: &BindingSpec) -> Result<NativeSymbol, BindError>;
}

/// Export tables plus the platform loader.
pub struct DynamicLinker {
    mode: LinkMode,
    exports: RwLock<HashMap<&'static str, usize>>,
    libraries: Mutex<HashMap<String, Arc<Library>>>,
}

impl DynamicLinker {
    /// A linker with no export tables registered.
    #[must_use]
    pub fn new(mode: LinkMode) -> Self {
        Self {
            mode,
            exports: RwLock::new(HashMap::new()),
            libraries: Mutex::new(HashMap::new()),
        }
    }

    /// Linker for the configured mode with the `ffibind-win32` exports
    /// registered.
    #[must_use]
    pub fn from_env() -> Self {
        let linker = Self::new(config::link_mode());
        linker.register_exports(ffibind_win32::exports());
        linker
    }

    #[must_use]
    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Publish an export table. Later registrations of a name replace earlier
    /// ones; already-attached symbols are unaffected.
    pub fn register_exports(&self, table: impl IntoIterator<Item = ExportedSymbol>) {
        let mut exports = self.exports.write();
        for export in table {
            exports.insert(export.name, export.address);
        }
    }

    /// Names of all registered exports, sorted.
    #[must_use]
    pub fn export_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.exports.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn lookup_export(&self, name: &str) -> Option<usize> {
        self.exports.read().get(name).copied()
    }

    /// Open `library` through the platform loader, reusing an earlier handle.
    fn open_library(&self, library: &str) -> Result<(String, Arc<Library>), String> {
        let file = library_file(library);
        let display = file.to_string_lossy().into_owned();
        let mut libraries = self.libraries.lock();
        if let Some(handle) = libraries.get(&library.to_lowercase()) {
            return Ok((display, Arc::clone(handle)));
        }
        // SAFETY: loading runs the library's initializers; callers name the
        // libraries they bind against.
        let handle = unsafe { Library::new(&file) }
            .map(Arc::new)
            .map_err(|e| format!("cannot load `{display}`: {e}"))?;
        libraries.insert(library.to_lowercase(), Arc::clone(&handle));
        Ok((display, handle))
    }

    fn resolve_in_loader(&self, spec: &BindingSpec) -> Result<NativeSymbol, String> {
        let (file, library) = self.open_library(spec.library())?;
        // SAFETY: the symbol is only used as an address; its type is the
        // binding's signature, enforced by the call interface.
        let address = unsafe {
            library
                .get::<unsafe extern "C" fn()>(spec.function().as_bytes())
                .map(|sym| *sym as usize)
        }
        .map_err(|e| format!("`{}` not found in `{file}`: {e}", spec.function()))?;
        Ok(NativeSymbol::from_library(address, file, library))
    }
}

impl SymbolResolver for DynamicLinker {
    fn resolve(&self, spec: &BindingSpec) -> Result<NativeSymbol, BindError> {
        let mut reasons = Vec::new();

        if self.mode.uses_exports() {
            match self.lookup_export(spec.key().as_str()) {
                Some(address) => return Ok(NativeSymbol::new(address, SymbolOrigin::Export)),
                None => reasons.push(format!("no in-process export `{}`", spec.key())),
            }
        }

        if self.mode.uses_loader() {
            match self.resolve_in_loader(spec) {
                Ok(symbol) => return Ok(symbol),
                Err(reason) => reasons.push(reason),
            }
        }

        Err(BindError::SymbolResolutionFailure {
            library: spec.library().to_string(),
            function: spec.function().to_string(),
            reason: reasons.join("; "),
        })
    }
}

/// File the platform loader should open for a library identifier.
///
/// Identifiers that already look like a file (a path separator or a
/// `.so`/`.dll`/`.dylib` component) are used as given; bare names get the
/// platform prefix and suffix (`advapi32` -> `libadvapi32.so`).
fn library_file(library: &str) -> OsString {
    let looks_like_file = library.contains(std::path::MAIN_SEPARATOR)
        || library.contains('/')
        || library
            .split('.')
            .skip(1)
            .any(|ext| matches!(ext.to_ascii_lowercase().as_str(), "so" | "dll" | "dylib"));
    if looks_like_file {
        OsString::from(library)
    } else {
        libloading::library_filename(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn answer() -> i32 {
        42
    }

    fn spec(library: &str, function: &str) -> BindingSpec {
        BindingSpec::new(library, function, "", "i").unwrap()
    }

    #[test]
    fn export_lookup_uses_symbol_key() {
        let linker = DynamicLinker::new(LinkMode::Exports);
        linker.register_exports([ExportedSymbol::new("testlib_Answer", answer as usize)]);

        let symbol = linker.resolve(&spec("TestLib", "Answer")).unwrap();
        assert_eq!(symbol.address(), answer as usize);
        assert_eq!(symbol.origin(), &SymbolOrigin::Export);
    }

    #[test]
    fn exports_only_mode_never_loads() {
        let linker = DynamicLinker::new(LinkMode::Exports);
        let err = linker.resolve(&spec("TestLib", "Missing")).unwrap_err();
        match err {
            BindError::SymbolResolutionFailure { reason, .. } => {
                assert!(reason.contains("testlib_Missing"));
                assert!(!reason.contains("cannot load"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(linker.libraries.lock().is_empty());
    }

    #[test]
    fn loader_mode_skips_exports() {
        let linker = DynamicLinker::new(LinkMode::Loader);
        linker.register_exports([ExportedSymbol::new("testlib_Answer", answer as usize)]);
        let err = linker
            .resolve(&spec("ffibind_no_such_library_1f3a", "Answer"))
            .unwrap_err();
        match err {
            BindError::SymbolResolutionFailure { reason, .. } => {
                assert!(reason.contains("cannot load"));
                assert!(!reason.contains("export"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn auto_mode_reports_every_failed_step() {
        let linker = DynamicLinker::new(LinkMode::Auto);
        let err = linker
            .resolve(&spec("ffibind_no_such_library_1f3a", "Nope"))
            .unwrap_err();
        let BindError::SymbolResolutionFailure { reason, .. } = err else {
            panic!("expected resolution failure");
        };
        assert!(reason.contains("no in-process export"));
        assert!(reason.contains("cannot load"));
    }

    #[test]
    fn export_names_are_sorted() {
        let linker = DynamicLinker::new(LinkMode::Auto);
        linker.register_exports([
            ExportedSymbol::new("b_two", answer as usize),
            ExportedSymbol::new("a_one", answer as usize),
        ]);
        assert_eq!(linker.export_names(), vec!["a_one", "b_two"]);
    }

    #[test]
    fn from_env_registers_win32_shim() {
        let linker = DynamicLinker::from_env();
        assert!(linker.export_names().contains(&"advapi32_GetUserName"));
    }

    #[test]
    fn library_file_naming() {
        assert_eq!(library_file("libc.so.6"), OsString::from("libc.so.6"));
        assert_eq!(library_file("/opt/lib/x.so"), OsString::from("/opt/lib/x.so"));
        assert_eq!(library_file("user32.dll"), OsString::from("user32.dll"));
        assert_eq!(library_file("advapi32"), libloading::library_filename("advapi32"));
    }
}
