use tracing_subscriber::EnvFilter;

use crate::constants::ENV_DEBUG;

/// Initialize tracing for a jirastats tool.
///
/// `RUST_LOG` wins when set; otherwise the level comes from [`default_level`].
/// Logs go to stderr so stdout only carries tool output. Load `.env` first
/// (see `Context::load_dotenv`) so its variables count.
pub fn init(verbose: bool) {
    let level = default_level(verbose, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `debug` when `verbose` is requested or `JIRASTATS_DEBUG` is present, else `info`
pub fn default_level<F>(verbose: bool, lookup: F) -> &'static str
where
    F: Fn(&str) -> Option<String>,
{
    if verbose || lookup(ENV_DEBUG).is_some() {
        "debug"
    } else {
        "info"
    }
}
