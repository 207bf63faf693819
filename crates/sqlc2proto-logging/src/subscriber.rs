//! `fmt` subscriber construction

use crate::LogLevel;
use std::io::IsTerminal;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Environment variable whose directives override the CLI level
pub const ENV_VAR: &str = "RUST_LOG";

/// Filter from the `RUST_LOG` directives in `env` when they parse, else
/// the given level.
pub fn build_filter(level: LogLevel, env: Option<&str>) -> EnvFilter {
    env.map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_directive()))
}

/// Compact `fmt` subscriber writing to `writer`.
pub fn fmt_subscriber<W>(filter: EnvFilter, writer: W, ansi: bool) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .without_time()
        .finish()
}

/// Initialize logging to stderr at `level`
///
/// `RUST_LOG`, when set and valid, replaces the level. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(level: LogLevel) {
    let env = std::env::var(ENV_VAR).ok();
    let ansi = std::io::stderr().is_terminal();
    let subscriber = fmt_subscriber(build_filter(level, env.as_deref()), std::io::stderr, ansi);

    // Try to set as global default (ignore error if already set)
    let _ = tracing::subscriber::set_global_default(subscriber);
}
