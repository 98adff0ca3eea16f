use tracing_subscriber::EnvFilter;

/// Plain-text subscriber for CloudWatch: no colours, no timestamps (the log
/// service stamps each line). Filter comes from `RUST_LOG`, `info` otherwise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init();

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already set: {}", e);
    }
}
