//! The one piece of process-wide global state the engine carries: an
//! optional debug sink for diagnostics, lazily initialised and safe to
//! leave unset (spec §9).

use std::sync::OnceLock;
use std::sync::RwLock;

type Sink = Box<dyn Fn(&str) + Send + Sync>;

static DEBUG_SINK: OnceLock<RwLock<Option<Sink>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Sink>> {
    DEBUG_SINK.get_or_init(|| RwLock::new(None))
}

/// Install a process-wide debug sink. Replaces whatever was set before.
pub fn set_debug_sink(sink: impl Fn(&str) + Send + Sync + 'static) {
    *slot().write().unwrap() = Some(Box::new(sink));
}

/// Remove the debug sink, if any.
pub fn clear_debug_sink() {
    *slot().write().unwrap() = None;
}

/// Emit a diagnostic line through both `tracing` and, if installed, the
/// debug sink. Node-core call sites use this instead of reaching for
/// `tracing::debug!` directly so a host application can also capture these
/// lines without configuring a subscriber.
pub fn emit_debug(line: impl AsRef<str>) {
    let line = line.as_ref();
    tracing::debug!("{}", line);
    if let Some(sink) = slot().read().unwrap().as_ref() {
        sink(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn installed_sink_receives_emitted_lines() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured2 = captured.clone();
        set_debug_sink(move |line| captured2.lock().unwrap().push(line.to_string()));

        emit_debug("probe line");
        assert!(captured.lock().unwrap().iter().any(|l| l == "probe line"));

        clear_debug_sink();
    }
}
