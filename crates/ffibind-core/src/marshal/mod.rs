//! Per-call argument normalization.
//!
//! Each parameter gets an [`ArgRule`] when the binding is constructed; calls
//! only run the pre-selected rules over the supplied [`Value`]s. Rules apply
//! the two conventions callers rely on:
//!
//! - integer `0` in a pointer slot is the null pointer, and
//! - an `int` slot folds values in `[2^31, 2^32)` into the negative range, so
//!   unsigned 32-bit bit patterns reach the native side as the signed value
//!   with the same bits.

use std::ffi::c_long;

use crate::error::BindError;
use crate::typecode::TypeCode;

/// Values at or above this are folded in `int` slots.
pub const INT_FOLD_THRESHOLD: i64 = 1 << 31;
/// Width of the `int` fold (the native int is exactly 32 bits).
pub const INT_FOLD_MODULUS: i64 = 1 << 32;

/// A caller-supplied argument.
#[derive(Debug, PartialEq, Eq)]
pub enum Value<'a> {
    /// Integer. In a pointer slot `0` is the null pointer and other values
    /// are raw addresses.
    Int(i64),
    /// Explicit null pointer.
    Null,
    /// Raw address.
    Address(usize),
    /// Caller-owned writable memory, passed by address.
    Buffer(&'a mut [u8]),
    /// Caller-owned read-only memory, passed by address.
    Bytes(&'a [u8]),
}

impl Value<'_> {
    /// Short name of the value's shape, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Null => "null",
            Self::Address(_) => "address",
            Self::Buffer(_) => "buffer",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<i64> for Value<'_> {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value<'_> {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value<'_> {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl<'a> From<&'a mut [u8]> for Value<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        Self::Buffer(buf)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

/// A normalized native argument word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArg {
    Pointer(usize),
    Long(c_long),
    Int(i32),
}

/// Raw result of a native call. Failure sentinels are not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeValue {
    Void,
    Int(i32),
    Long(i64),
    Pointer(usize),
}

impl NativeValue {
    /// Returns `true` for a numeric zero result (the usual native FALSE).
    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Void => false,
            Self::Int(v) => v == 0,
            Self::Long(v) => v == 0,
            Self::Pointer(p) => p == 0,
        }
    }
}

/// Marshalling rule for one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRule {
    /// Null-sentinel substitution; buffers pass their base address.
    Pointer,
    /// Pass-through as C `long`.
    Long,
    /// 32-bit two's-complement fold.
    Int,
}

impl ArgRule {
    /// Rule for a parameter type. `Void` has no rule.
    #[must_use]
    pub const fn for_param(code: TypeCode) -> Option<Self> {
        match code {
            TypeCode::Pointer => Some(Self::Pointer),
            TypeCode::Long => Some(Self::Long),
            TypeCode::Int => Some(Self::Int),
            TypeCode::Void => None,
        }
    }

    #[must_use]
    pub const fn type_code(self) -> TypeCode {
        match self {
            Self::Pointer => TypeCode::Pointer,
            Self::Long => TypeCode::Long,
            Self::Int => TypeCode::Int,
        }
    }

    /// Normalize the argument at `index`.
    pub fn apply(self, index: usize, value: &mut Value<'_>) -> Result<NativeArg, BindError> {
        let mismatch = |value: &Value<'_>| BindError::ArgumentTypeMismatch {
            index,
            expected: self.type_code(),
            found: value.kind(),
        };
        let out_of_range = |value: i64| BindError::IntegerOutOfRange { index, value };

        match self {
            Self::Pointer => match value {
                Value::Int(0) | Value::Null => Ok(NativeArg::Pointer(0)),
                Value::Int(v) => usize::try_from(*v)
                    .map(NativeArg::Pointer)
                    .map_err(|_| out_of_range(*v)),
                Value::Address(addr) => Ok(NativeArg::Pointer(*addr)),
                Value::Buffer(buf) => Ok(NativeArg::Pointer(buf.as_mut_ptr() as usize)),
                Value::Bytes(bytes) => Ok(NativeArg::Pointer(bytes.as_ptr() as usize)),
            },
            Self::Long => match value {
                Value::Int(v) => c_long::try_from(*v)
                    .map(NativeArg::Long)
                    .map_err(|_| out_of_range(*v)),
                other => Err(mismatch(&*other)),
            },
            Self::Int => match value {
                Value::Int(v) => fold_int(*v).map(NativeArg::Int).ok_or(out_of_range(*v)),
                other => Err(mismatch(&*other)),
            },
        }
    }
}

/// Fold a value into the signed 32-bit range.
///
/// `[2^31, 2^32)` maps to `[-2^31, 0)`; values already in `i32` range are
/// unchanged; everything else does not fit.
#[must_use]
pub fn fold_int(value: i64) -> Option<i32> {
    let folded = if (INT_FOLD_THRESHOLD..INT_FOLD_MODULUS).contains(&value) {
        value - INT_FOLD_MODULUS
    } else {
        value
    };
    i32::try_from(folded).ok()
}

/// Select one rule per parameter.
#[must_use]
pub fn rules_for(params: &[TypeCode]) -> Vec<ArgRule> {
    params.iter().copied().filter_map(ArgRule::for_param).collect()
}

/// Normalize a full argument list.
///
/// The arity check runs first: a mismatch fails before any rule is applied.
pub fn marshal_args(rules: &[ArgRule], args: &mut [Value<'_>]) -> Result<Vec<NativeArg>, BindError> {
    if args.len() != rules.len() {
        return Err(BindError::ArgumentCountMismatch {
            expected: rules.len(),
            actual: args.len(),
        });
    }
    rules
        .iter()
        .zip(args.iter_mut())
        .enumerate()
        .map(|(index, (rule, value))| rule.apply(index, value))
        .collect()
}
