//! Process-wide symbol table: each symbol key is resolved and attached once.
//!
//! The table lock is held across resolution, so concurrent first binds of the
//! same key resolve exactly once and observe the same [`ResolvedSymbol`].
//! Entries are never evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use ffibind_core::{BindError, BindingSpec, Signature, SymbolKey};
use parking_lot::Mutex;

use crate::linker::{NativeSymbol, SymbolOrigin, SymbolResolver};

/// Whether [`SymbolTable::attach`] resolved a new symbol or reused one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachKind {
    Attached,
    Reused,
}

/// A native symbol attached under a key, with the signature of its first bind.
#[derive(Debug)]
pub struct ResolvedSymbol {
    key: SymbolKey,
    signature: Signature,
    symbol: NativeSymbol,
}

impl ResolvedSymbol {
    #[must_use]
    pub fn key(&self) -> &SymbolKey {
        &self.key
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn address(&self) -> usize {
        self.symbol.address()
    }

    #[must_use]
    pub fn origin(&self) -> &SymbolOrigin {
        self.symbol.origin()
    }
}

/// Registry of attached symbols.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Mutex<HashMap<SymbolKey, Arc<ResolvedSymbol>>>,
    resolutions: AtomicU64,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the symbol attached under `spec`'s key, resolving it through
    /// `resolver` if the key has not been seen.
    ///
    /// A known key is reused whatever signature the new request carries; the
    /// entry only pins the address. A failed resolution leaves the table
    /// unchanged, so a later attach retries.
    pub fn attach(
        &self,
        spec: &BindingSpec,
        resolver: &dyn SymbolResolver,
    ) -> Result<(Arc<ResolvedSymbol>, AttachKind), BindError> {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(spec.key()) {
            return Ok((Arc::clone(existing), AttachKind::Reused));
        }

        let symbol = resolver.resolve(spec)?;
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let resolved = Arc::new(ResolvedSymbol {
            key: spec.key().clone(),
            signature: spec.signature().clone(),
            symbol,
        });
        entries.insert(spec.key().clone(), Arc::clone(&resolved));
        Ok((resolved, AttachKind::Attached))
    }

    #[must_use]
    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Successful resolver calls made by this table.
    #[must_use]
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }
}

static GLOBAL_TABLE: OnceLock<Arc<SymbolTable>> = OnceLock::new();

/// The process-wide table used by [`crate::bind`].
pub fn global_symbol_table() -> Arc<SymbolTable> {
    Arc::clone(GLOBAL_TABLE.get_or_init(|| Arc::new(SymbolTable::new())))
}
