use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

static INIT_TRACING: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the fmt subscriber with [`DEFAULT_LOG_FILTER`]. See [`init_tracing_with`].
pub fn init_tracing() -> bool {
    init_tracing_with(DEFAULT_LOG_FILTER)
}

/// Install the fmt subscriber once per process, filtered by `RUST_LOG` or else `default_filter`.
///
/// Returns whether a subscriber from this crate is active. `false` means another global
/// subscriber was already set by the embedding program; its filter then applies.
pub fn init_tracing_with(default_filter: &str) -> bool {
    INIT_TRACING.call_once(|| {
        let (filter, source) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, "RUST_LOG"),
            Err(_) => (EnvFilter::new(default_filter), "default"),
        };
        let directives = filter.to_string();

        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok();
        INSTALLED.store(installed, Ordering::Release);

        if installed {
            info!(filter = %directives, source, "range_vfs logging ready");
        }
    });
    INSTALLED.load(Ordering::Acquire)
}
