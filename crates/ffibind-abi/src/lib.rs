//! # ffibind-abi
//!
//! Native side of ffibind: turns a [`BindingSpec`] into a [`Callable`] bound
//! to a resolved native symbol.
//!
//! # Architecture
//!
//! ```text
//! bind(lib, fn, params, ret)
//!   -> BindingSpec (ffibind-core: translate codes)
//!   -> SymbolTable::attach (lock; resolve once via SymbolResolver)
//!   -> Callable { arg rules, libffi Cif, Arc<ResolvedSymbol> }
//!
//! callable.call(args)
//!   -> marshal_args (arity, null sentinel, int fold)
//!   -> libffi call through the resolved address
//! ```
//!
//! Symbols are resolved by a [`SymbolResolver`]. The default
//! [`DynamicLinker`] looks in in-process export tables (the `ffibind-win32`
//! shim is registered by default) and then the platform loader, as allowed by
//! `FFIBIND_LINK_MODE`.

pub mod account;
mod binding;
mod ffi_call;
pub mod linker;
pub mod log_sink;
pub mod symbol_table;

pub use binding::{Binder, Callable, bind, default_linker};
pub use linker::{DynamicLinker, NativeSymbol, SymbolOrigin, SymbolResolver};
pub use symbol_table::{AttachKind, ResolvedSymbol, SymbolTable, global_symbol_table};

pub use ffibind_core::{
    BindError, BindingSpec, NativeValue, ParamCodes, Signature, SymbolKey, TypeCode, Value,
};
