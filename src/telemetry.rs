use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a JSON subscriber filtered by `RUST_LOG`
///
/// Intended for binaries and tests that embed the crate; calling it twice
/// is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flow_uncertainty=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .try_init();
}
