pub mod build_info;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

const DEFAULT_LOG_DIRECTIVE: &str = "stockbook=info";

/// Installs the global fmt subscriber. A valid `RUST_LOG` replaces the `stockbook=info` default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::fmt;

        let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
        // Another subscriber may already be installed by the embedding application.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}
