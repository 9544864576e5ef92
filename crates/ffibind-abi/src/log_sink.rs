//! Process-wide structured log sink for binding and call events.
//!
//! Opened lazily from `FFIBIND_LOG` on first use. Tools and tests can
//! replace it with [`install`]. Write failures are dropped; logging never
//! changes the outcome of a bind or call.

use std::sync::OnceLock;

use ffibind_core::config::{self, LogTarget};
use ffibind_core::structured_log::{LogEmitter, LogEntry};
use parking_lot::Mutex;

static SINK: OnceLock<Mutex<Option<LogEmitter>>> = OnceLock::new();

fn sink() -> &'static Mutex<Option<LogEmitter>> {
    SINK.get_or_init(|| Mutex::new(open_from_env()))
}

fn open_from_env() -> Option<LogEmitter> {
    let run_id = run_id();
    match config::log_target()? {
        LogTarget::Stderr => Some(LogEmitter::to_stderr(&run_id)),
        LogTarget::File(path) => LogEmitter::to_file(&path, &run_id).ok(),
    }
}

/// Run id used for trace ids of the default sink.
#[must_use]
pub fn run_id() -> String {
    format!("ffibind-{}", std::process::id())
}

/// Replace the sink, returning the previous one.
///
/// Installing before first use skips `FFIBIND_LOG` entirely; the configured
/// file is never opened.
pub fn install(emitter: LogEmitter) -> Option<LogEmitter> {
    let mut pending = Some(emitter);
    let sink = SINK.get_or_init(|| Mutex::new(pending.take()));
    pending.and_then(|emitter| sink.lock().replace(emitter))
}

/// Remove the sink, returning it (flushed).
pub fn uninstall() -> Option<LogEmitter> {
    let mut previous = sink().lock().take();
    if let Some(emitter) = previous.as_mut() {
        let _ = emitter.flush();
    }
    previous
}

#[must_use]
pub fn enabled() -> bool {
    sink().lock().is_some()
}

/// Emit the entry built by `make`, if a sink is installed.
///
/// An empty `trace_id` is assigned by the emitter.
pub(crate) fn emit_with(make: impl FnOnce() -> LogEntry) {
    let mut guard = sink().lock();
    if let Some(emitter) = guard.as_mut() {
        let _ = emitter.emit_entry(make());
    }
}
