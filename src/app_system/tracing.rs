/// Installs the global subscriber. Call once at startup.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used, e.g.
/// `RUST_LOG=agri_cart::cart_actor=debug,info`.
pub fn setup_tracing(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .init();
}
