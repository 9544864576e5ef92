//! Type codes: the compact parameter and return vocabulary.
//!
//! A binding describes its native signature with one-character codes:
//!
//! | code | type | native ABI type |
//! |------|------|-----------------|
//! | `p`  | [`TypeCode::Pointer`] | pointer-sized address |
//! | `l`  | [`TypeCode::Long`] | C `long` |
//! | `n`, `i` | [`TypeCode::Int`] | 32-bit signed integer |
//! | `v`  | [`TypeCode::Void`] | no value (return position only) |
//!
//! Codes are case-insensitive. Anything else is rejected: a wrong ABI type on
//! a native call corrupts memory, so there is no fallback type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// Native ABI type selected by a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCode {
    /// Pointer-sized address.
    Pointer,
    /// Platform C `long`.
    Long,
    /// 32-bit two's-complement signed integer.
    Int,
    /// No value. Only meaningful as a return type.
    Void,
}

impl TypeCode {
    /// Translate a single code character (case-insensitive).
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pointer),
            'l' => Some(Self::Long),
            'n' | 'i' => Some(Self::Int),
            'v' => Some(Self::Void),
            _ => None,
        }
    }

    /// Translate a textual type code.
    ///
    /// The input must be exactly one recognized character; surrounding
    /// whitespace or longer spellings (`"pointer"`) are not accepted.
    pub fn translate(code: &str) -> Result<Self, BindError> {
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
        .ok_or_else(|| BindError::UnknownTypeCode {
            code: code.to_string(),
        })
    }

    /// Canonical lower-case code character.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Pointer => 'p',
            Self::Long => 'l',
            Self::Int => 'i',
            Self::Void => 'v',
        }
    }

    /// Human-readable name of the native ABI type.
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Long => "long",
            Self::Int => "int",
            Self::Void => "void",
        }
    }

    /// Returns `true` if this code may appear in a parameter position.
    #[must_use]
    pub const fn is_value_type(self) -> bool {
        !matches!(self, Self::Void)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_every_recognized_code_in_both_cases() {
        let table = [
            ("p", TypeCode::Pointer),
            ("l", TypeCode::Long),
            ("n", TypeCode::Int),
            ("i", TypeCode::Int),
            ("v", TypeCode::Void),
        ];
        for (code, expected) in table {
            assert_eq!(TypeCode::translate(code), Ok(expected), "code {code}");
            let upper = code.to_ascii_uppercase();
            assert_eq!(TypeCode::translate(&upper), Ok(expected), "code {upper}");
        }
    }

    #[test]
    fn rejects_unrecognized_codes() {
        for code in ["", "x", "q", "pp", " p", "pointer", "int", "0", "é"] {
            assert_eq!(
                TypeCode::translate(code),
                Err(BindError::UnknownTypeCode {
                    code: code.to_string()
                }),
                "code {code:?}"
            );
        }
    }

    #[test]
    fn symbol_round_trips_through_from_char() {
        for tc in [
            TypeCode::Pointer,
            TypeCode::Long,
            TypeCode::Int,
            TypeCode::Void,
        ] {
            assert_eq!(TypeCode::from_char(tc.symbol()), Some(tc));
        }
    }

    #[test]
    fn void_is_not_a_value_type() {
        assert!(!TypeCode::Void.is_value_type());
        assert!(TypeCode::Pointer.is_value_type());
        assert!(TypeCode::Long.is_value_type());
        assert!(TypeCode::Int.is_value_type());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&TypeCode::Pointer).unwrap();
        assert_eq!(json, "\"pointer\"");
    }
}
