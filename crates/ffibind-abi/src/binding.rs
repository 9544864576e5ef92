//! Binding construction and invocation.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ffibind_core::marshal::{self, ArgRule};
use ffibind_core::structured_log::{LogEntry, LogLevel, Outcome};
use ffibind_core::{BindError, BindingSpec, NativeValue, ParamCodes, SymbolKey, Value};

use crate::ffi_call::CallInterface;
use crate::linker::{DynamicLinker, SymbolResolver};
use crate::log_sink;
use crate::symbol_table::{AttachKind, ResolvedSymbol, SymbolTable, global_symbol_table};

static DEFAULT_LINKER: OnceLock<Arc<DynamicLinker>> = OnceLock::new();

/// The process-wide linker: configured from `FFIBIND_LINK_MODE`, with the
/// `ffibind-win32` exports registered.
pub fn default_linker() -> Arc<DynamicLinker> {
    Arc::clone(DEFAULT_LINKER.get_or_init(|| Arc::new(DynamicLinker::from_env())))
}

/// Bind `function` in `library` using the process-wide table and linker.
///
/// ```no_run
/// let get_user_name = ffibind_abi::bind("ADVAPI32", "GetUserName", "pp", "i")?;
/// # Ok::<(), ffibind_abi::BindError>(())
/// ```
pub fn bind<'a>(
    library: &str,
    function: &str,
    params: impl Into<ParamCodes<'a>>,
    ret: &str,
) -> Result<Callable, BindError> {
    Binder::process().bind(library, function, params, ret)
}

/// Binds functions against one symbol table through one resolver.
#[derive(Clone)]
pub struct Binder {
    table: Arc<SymbolTable>,
    resolver: Arc<dyn SymbolResolver>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("attached", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Binder {
    #[must_use]
    pub fn new(table: Arc<SymbolTable>, resolver: Arc<dyn SymbolResolver>) -> Self {
        Self { table, resolver }
    }

    /// Binder over the process-wide table and [`default_linker`].
    #[must_use]
    pub fn process() -> Self {
        Self::new(global_symbol_table(), default_linker())
    }

    #[must_use]
    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    /// Translate the codes, attach the symbol once, and return a callable.
    ///
    /// Unknown codes fail before any symbol lookup.
    pub fn bind<'a>(
        &self,
        library: &str,
        function: &str,
        params: impl Into<ParamCodes<'a>>,
        ret: &str,
    ) -> Result<Callable, BindError> {
        let spec = BindingSpec::new(library, function, params, ret).inspect_err(|err| {
            log_sink::emit_with(|| {
                LogEntry::new(String::new(), LogLevel::Warn, bind_error_event(err))
                    .with_symbol(library, SymbolKey::new(library, function).as_str())
                    .with_outcome(Outcome::Rejected)
                    .with_error(err)
            });
        })?;
        self.bind_spec(spec)
    }

    pub fn bind_spec(&self, spec: BindingSpec) -> Result<Callable, BindError> {
        match self.table.attach(&spec, self.resolver.as_ref()) {
            Ok((symbol, kind)) => {
                log_sink::emit_with(|| {
                    let (event, outcome) = match kind {
                        AttachKind::Attached => ("bind.attach", Outcome::Attached),
                        AttachKind::Reused => ("bind.reuse", Outcome::Reused),
                    };
                    spec_entry(&spec, LogLevel::Debug, event)
                        .with_outcome(outcome)
                        .with_details(serde_json::json!({
                            "origin": symbol.origin().to_string(),
                            "attached_signature": symbol.signature().compact(),
                        }))
                });
                Ok(Callable::new(spec, symbol))
            }
            Err(err) => {
                log_sink::emit_with(|| {
                    spec_entry(&spec, LogLevel::Warn, bind_error_event(&err))
                        .with_outcome(Outcome::Rejected)
                        .with_error(&err)
                });
                Err(err)
            }
        }
    }
}

/// Event name for a failed bind, by error kind.
fn bind_error_event(err: &BindError) -> &'static str {
    match err {
        BindError::SymbolResolutionFailure { .. } => "bind.resolve_failed",
        _ => "bind.rejected",
    }
}

fn spec_entry(spec: &BindingSpec, level: LogLevel, event: &str) -> LogEntry {
    LogEntry::new(String::new(), level, event)
        .with_symbol(spec.library(), spec.key().as_str())
        .with_signature(spec.signature().compact())
}

/// A bound native function.
///
/// Cheap to share across threads; every callable bound to the same key holds
/// the same [`ResolvedSymbol`].
pub struct Callable {
    spec: BindingSpec,
    rules: Vec<ArgRule>,
    symbol: Arc<ResolvedSymbol>,
    interface: CallInterface,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("key", self.spec.key())
            .field("signature", &self.spec.signature().compact())
            .field("origin", self.symbol.origin())
            .finish_non_exhaustive()
    }
}

impl Callable {
    fn new(spec: BindingSpec, symbol: Arc<ResolvedSymbol>) -> Self {
        let rules = marshal::rules_for(spec.params());
        let interface = CallInterface::new(spec.signature());
        Self {
            spec,
            rules,
            symbol,
            interface,
        }
    }

    #[must_use]
    pub fn spec(&self) -> &BindingSpec {
        &self.spec
    }

    #[must_use]
    pub fn symbol(&self) -> &Arc<ResolvedSymbol> {
        &self.symbol
    }

    /// Number of arguments a call must supply.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.rules.len()
    }

    /// Invoke the native function.
    ///
    /// Arguments are normalized first (arity check, null sentinel, `int`
    /// fold); a rejected call never reaches native code. The native result is
    /// returned as-is.
    ///
    /// # Safety
    ///
    /// The bound signature must match the native function's real signature,
    /// and pointer arguments must be valid for whatever the function does with
    /// them. Buffers are borrowed for the duration of the call only.
    pub unsafe fn call(&self, args: &mut [Value<'_>]) -> Result<NativeValue, BindError> {
        let native = match marshal::marshal_args(&self.rules, args) {
            Ok(native) => native,
            Err(err) => {
                log_sink::emit_with(|| {
                    spec_entry(&self.spec, LogLevel::Warn, "call.rejected")
                        .with_outcome(Outcome::Rejected)
                        .with_error(&err)
                });
                return Err(err);
            }
        };
        // SAFETY: upheld by the caller; arguments were marshalled for this
        // signature.
        Ok(unsafe { self.interface.invoke(self.symbol.address(), &native) })
    }
}
