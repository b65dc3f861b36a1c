use tracing::Level;

/// Install the global `tracing` subscriber.
///
/// `level` is any name `tracing::Level` parses (`error` through `trace`,
/// any case). Unrecognized values fall back to `info` and say so once the
/// subscriber is up.
pub fn init(level: &str) {
    let parsed = level.trim().parse::<Level>();
    let max_level = parsed.as_ref().copied().unwrap_or(Level::INFO);

    // try_init: tests and the binary may both call this
    let installed = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed && parsed.is_err() {
        tracing::warn!("unknown log level {level:?}, using info");
    }
}
