use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set, otherwise `default_level` (usually `Config::log_level`) is used.
pub fn init_tracing(service_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
            // In production, you might want to use .json() instead of pretty print
            // .json()
        )
        .try_init();

    if installed.is_ok() {
        tracing::info!("Starting service: {}", service_name);
    }
}
