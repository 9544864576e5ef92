//! Runtime configuration.
//!
//! The symbol lookup order is set via the `FFIBIND_LINK_MODE` environment
//! variable:
//! - `auto` (default): in-process export tables first, then the platform
//!   loader.
//! - `exports`: in-process export tables only. Nothing is loaded from disk.
//! - `loader`: the platform loader only.
//!
//! The structured log sink is set via `FFIBIND_LOG`: a file path, or `stderr`.
//! Logging is off when the variable is unset or empty.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

pub const LINK_MODE_ENV: &str = "FFIBIND_LINK_MODE";
pub const LOG_ENV: &str = "FFIBIND_LOG";

/// Where the dynamic linker looks for symbols.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
    /// Export tables, then the platform loader.
    #[default]
    Auto,
    /// In-process export tables only.
    Exports,
    /// Platform loader only.
    Loader,
}

impl LinkMode {
    /// Parse from string (case-insensitive). Unknown values select `Auto`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "exports" | "export" | "process" | "shim" => Self::Exports,
            "loader" | "dlopen" | "system" => Self::Loader,
            _ => Self::Auto,
        }
    }

    /// Returns true if in-process export tables are consulted.
    #[must_use]
    pub const fn uses_exports(self) -> bool {
        !matches!(self, Self::Loader)
    }

    /// Returns true if libraries may be loaded from disk.
    #[must_use]
    pub const fn uses_loader(self) -> bool {
        !matches!(self, Self::Exports)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exports => "exports",
            Self::Loader => "loader",
        }
    }
}

// Atomic cache: 0=unresolved, 1=Auto, 2=Exports, 3=Loader.
static CACHED_MODE: AtomicU8 = AtomicU8::new(0);

const MODE_UNRESOLVED: u8 = 0;
const MODE_AUTO: u8 = 1;
const MODE_EXPORTS: u8 = 2;
const MODE_LOADER: u8 = 3;

fn mode_to_u8(mode: LinkMode) -> u8 {
    match mode {
        LinkMode::Auto => MODE_AUTO,
        LinkMode::Exports => MODE_EXPORTS,
        LinkMode::Loader => MODE_LOADER,
    }
}

fn u8_to_mode(v: u8) -> LinkMode {
    match v {
        MODE_EXPORTS => LinkMode::Exports,
        MODE_LOADER => LinkMode::Loader,
        _ => LinkMode::Auto,
    }
}

/// Get the configured link mode (reads env var on first call, caches thereafter).
#[must_use]
pub fn link_mode() -> LinkMode {
    let cached = CACHED_MODE.load(Ordering::Acquire);
    if cached != MODE_UNRESOLVED {
        return u8_to_mode(cached);
    }
    let mode = std::env::var(LINK_MODE_ENV)
        .map(|v| LinkMode::from_str_loose(&v))
        .unwrap_or_default();
    // A concurrent first call or an explicit override may have won; keep it.
    match CACHED_MODE.compare_exchange(
        MODE_UNRESOLVED,
        mode_to_u8(mode),
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => mode,
        Err(current) => u8_to_mode(current),
    }
}

/// Pin the link mode for the rest of the process (CLI flags use this).
pub fn set_link_mode(mode: LinkMode) {
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
}

/// Destination of structured log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse a `FFIBIND_LOG` value. Empty means disabled.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.eq_ignore_ascii_case("stderr") || raw == "-" {
            return Some(Self::Stderr);
        }
        Some(Self::File(PathBuf::from(raw)))
    }
}

/// Log target from the environment, if any.
#[must_use]
pub fn log_target() -> Option<LogTarget> {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| LogTarget::parse(&v))
}
