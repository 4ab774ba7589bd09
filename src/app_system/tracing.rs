/// Sets up structured logging for the whole process.
///
/// - `RUST_LOG` controls verbosity, defaulting to `info`
/// - An uptime timer shows how long each operation takes
/// - Compact format keeps one event per line
///
/// ```bash
/// RUST_LOG=debug cbc                          # everything, client sends included
/// RUST_LOG=cbc::repository=debug,info cbc     # repository handlers only
/// RUST_LOG=warn cbc                           # persistence warnings and errors
/// ```
pub fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .init();
}
