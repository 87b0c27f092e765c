//! tracing setup.
//!
//! The library only emits events. Hosts that want them on stderr call
//! [`init_logging`] once; `RUST_LOG` takes precedence over the default filter.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a compact stderr subscriber. Later calls are ignored.
pub fn init_logging(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .compact()
            .with_writer(std::io::stderr);

        // Another subscriber may already be installed by the host.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    });
}
