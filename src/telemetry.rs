use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` picks the filter, defaulting to
/// `info` for this crate.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("suite_runner=info,tower_http=info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
