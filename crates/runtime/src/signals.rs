//! Ctrl-C -> cooperative `HALT` (`spec.md` §9's halt-pending signal,
//! the embedding contract behind `quit`/`halt` in `natives.rs`).
//!
//! Grounded on the teacher's idempotent `Once`-guarded signal-hook
//! registration (`navicore-cem3` `crates/runtime/src/diagnostics.rs`'s
//! SIGQUIT handler), generalized from "dump diagnostics to stderr" to
//! "flip the engine's halt flag", since a Rebol console's Ctrl-C
//! contract is to interrupt the running evaluation, not inspect it.
//! Feature-gated behind `signals` so embedders without a controlling
//! terminal (or on non-Unix targets) can opt out entirely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

static HANDLER_INIT: Once = Once::new();

/// Register a `SIGINT` handler that sets `halt` instead of terminating
/// the process; the evaluator checks it between steps
/// (`engine::Engine::halt_requested`). Safe to call more than once —
/// only the first registration takes effect.
pub fn install(halt: Arc<AtomicBool>) {
    HANDLER_INIT.call_once(|| {
        #[cfg(unix)]
        unsafe {
            let _ = signal_hook::low_level::register(signal_hook::consts::SIGINT, move || {
                halt.store(true, Ordering::Relaxed);
            });
        }

        #[cfg(not(unix))]
        {
            let _ = halt;
        }
    });
}
