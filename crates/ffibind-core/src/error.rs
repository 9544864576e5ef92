//! Error type shared by binding construction and invocation.

use thiserror::Error;

use crate::typecode::TypeCode;

/// Failures surfaced by ffibind.
///
/// Construction-time variants (`UnknownTypeCode`, `MalformedParamList`,
/// `SymbolResolutionFailure`) mean no binding was produced. Call-time variants only fail the call that raised them; the
/// binding stays usable for correctly shaped calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("unknown type code {code:?} (expected one of p, l, n, i, v)")]
    UnknownTypeCode { code: String },
    #[error("malformed parameter list {raw:?}: unexpected character at position {position}")]
    MalformedParamList { raw: String, position: usize },
    #[error("cannot resolve `{function}` in `{library}`: {reason}")]
    SymbolResolutionFailure {
        library: String,
        function: String,
        reason: String,
    },
    #[error("expected {expected} argument(s), got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },
    #[error("argument {index}: a {found} value cannot be passed as {expected}")]
    ArgumentTypeMismatch {
        index: usize,
        expected: TypeCode,
        found: &'static str,
    },
    #[error("argument {index}: {value} does not fit the native parameter type")]
    IntegerOutOfRange { index: usize, value: i64 },
}

impl BindError {
    /// Returns `true` for errors raised while constructing a binding.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTypeCode { .. }
                | Self::MalformedParamList { .. }
                | Self::SymbolResolutionFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_call_errors_are_distinguished() {
        let unknown = BindError::UnknownTypeCode { code: "x".into() };
        let arity = BindError::ArgumentCountMismatch {
            expected: 2,
            actual: 1,
        };
        assert!(unknown.is_construction_error());
        assert!(!arity.is_construction_error());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = BindError::SymbolResolutionFailure {
            library: "Advapi32".into(),
            function: "GetUserName".into(),
            reason: "not exported".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve `GetUserName` in `Advapi32`: not exported"
        );

        let err = BindError::ArgumentTypeMismatch {
            index: 1,
            expected: TypeCode::Int,
            found: "buffer",
        };
        assert_eq!(
            err.to_string(),
            "argument 1: a buffer value cannot be passed as int"
        );
    }
}
