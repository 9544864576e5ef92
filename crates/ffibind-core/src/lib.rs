//! # ffibind-core
//!
//! Pure logic behind ffibind's dynamic bindings.
//!
//! This crate knows how to turn the compact type-code vocabulary (`p`, `l`,
//! `n`/`i`, `v`) into native ABI type tags, how to build an immutable
//! [`BindingSpec`] from a library/function/parameter/return description, and
//! how to normalize call arguments into native argument words. It never
//! touches a loaded library; resolution and invocation live in `ffibind-abi`.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod marshal;
pub mod signature;
pub mod structured_log;
pub mod typecode;

pub use error::BindError;
pub use marshal::{ArgRule, NativeArg, NativeValue, Value};
pub use signature::{BindingSpec, ExportedSymbol, ParamCodes, Signature, SymbolKey};
pub use typecode::TypeCode;
