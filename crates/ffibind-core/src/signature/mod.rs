//! Binding descriptions: parameter lists, signatures and symbol keys.

use std::fmt;

use serde::Serialize;

use crate::error::BindError;
use crate::typecode::TypeCode;

/// Separator between the lower-cased library name and the function name in a
/// [`SymbolKey`].
pub const KEY_SEPARATOR: char = '_';

/// Parameter codes as supplied by the caller.
///
/// `Raw` is the compact string form (`"pp"`), split one code per character.
/// `List` carries one code per entry (`["p", "p"]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamCodes<'a> {
    Raw(&'a str),
    List(Vec<&'a str>),
}

impl<'a> From<&'a str> for ParamCodes<'a> {
    fn from(raw: &'a str) -> Self {
        Self::Raw(raw)
    }
}

impl<'a> From<&'a String> for ParamCodes<'a> {
    fn from(raw: &'a String) -> Self {
        Self::Raw(raw.as_str())
    }
}

impl<'a> From<Vec<&'a str>> for ParamCodes<'a> {
    fn from(list: Vec<&'a str>) -> Self {
        Self::List(list)
    }
}

impl<'a> From<&'a [&'a str]> for ParamCodes<'a> {
    fn from(list: &'a [&'a str]) -> Self {
        Self::List(list.to_vec())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for ParamCodes<'a> {
    fn from(list: [&'a str; N]) -> Self {
        Self::List(list.to_vec())
    }
}

impl<'a> From<&'a [String]> for ParamCodes<'a> {
    fn from(list: &'a [String]) -> Self {
        Self::List(list.iter().map(String::as_str).collect())
    }
}

impl ParamCodes<'_> {
    /// Translate into parameter types, dropping `void` entries.
    ///
    /// In the raw form every character must be a code. Letters outside the
    /// vocabulary are unknown codes; anything else (spaces, commas) makes the
    /// whole string malformed. Nothing is stripped or guessed.
    pub fn translate(&self) -> Result<Vec<TypeCode>, BindError> {
        let codes = match self {
            Self::Raw(raw) => raw
                .chars()
                .enumerate()
                .map(|(position, c)| {
                    TypeCode::from_char(c).ok_or_else(|| {
                        if c.is_alphanumeric() {
                            BindError::UnknownTypeCode {
                                code: c.to_string(),
                            }
                        } else {
                            BindError::MalformedParamList {
                                raw: (*raw).to_string(),
                                position,
                            }
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Self::List(list) => list
                .iter()
                .map(|code| TypeCode::translate(code))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(codes.into_iter().filter(|c| c.is_value_type()).collect())
    }
}

/// Key under which a resolved symbol is attached: `lowercase(library)_function`.
///
/// In-process shims export their entry points under this same name
/// (`advapi32_GetUserName`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SymbolKey(String);

impl SymbolKey {
    #[must_use]
    pub fn new(library: &str, function: &str) -> Self {
        let mut key = library.to_lowercase();
        key.push(KEY_SEPARATOR);
        key.push_str(function);
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entry point published by an in-process shim under its symbol key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportedSymbol {
    pub name: &'static str,
    pub address: usize,
}

impl ExportedSymbol {
    #[must_use]
    pub const fn new(name: &'static str, address: usize) -> Self {
        Self { name, address }
    }
}

/// Parameter and return types of a native function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
    pub params: Vec<TypeCode>,
    pub ret: TypeCode,
}

impl Signature {
    /// Compact form, e.g. `pp>i`.
    #[must_use]
    pub fn compact(&self) -> String {
        let mut out: String = self.params.iter().map(|p| p.symbol()).collect();
        out.push('>');
        out.push(self.ret.symbol());
        out
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Immutable description of one binding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingSpec {
    library: String,
    function: String,
    key: SymbolKey,
    signature: Signature,
}

impl BindingSpec {
    /// Translate a binding request.
    ///
    /// Fails on the first unknown or malformed code; void parameters are
    /// dropped since void only has meaning as a return type.
    pub fn new<'a>(
        library: &str,
        function: &str,
        params: impl Into<ParamCodes<'a>>,
        ret: &str,
    ) -> Result<Self, BindError> {
        let params = params.into().translate()?;
        let ret = TypeCode::translate(ret)?;
        Ok(Self {
            library: library.to_string(),
            function: function.to_string(),
            key: SymbolKey::new(library, function),
            signature: Signature { params, ret },
        })
    }

    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    #[must_use]
    pub fn key(&self) -> &SymbolKey {
        &self.key
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn params(&self) -> &[TypeCode] {
        &self.signature.params
    }

    #[must_use]
    pub fn ret(&self) -> TypeCode {
        self.signature.ret
    }
}
