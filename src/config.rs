//! Process-wide configuration.
//!
//! A single switch: `enable_fast_path` (default true). Disabling it forces
//! typed query surfaces through the dynamic tagged-value route so their
//! behavior can be compared against the fast path diagnostically. There is
//! no other externally tunable behavior.

use std::sync::atomic::{AtomicBool, Ordering};

static FAST_PATH_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable or disable the typed fast path.
pub fn set_fast_path_enabled(enabled: bool) {
    if !enabled {
        log::info!("fast path disabled: typed queries will take the dynamic route");
    }
    FAST_PATH_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether typed query surfaces use the fast path.
pub fn fast_path_enabled() -> bool {
    FAST_PATH_ENABLED.load(Ordering::Relaxed)
}
