use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "TRANSCRIBE_SRT_LOG";

/// Initialize logging on stdout.
///
/// Defaults to `info` unless overridden by `TRANSCRIBE_SRT_LOG`. Plain text by default, one JSON
/// object per line when `json` is set. Safe to call more than once.
pub fn init(json: bool) {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV)
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);

    let _ = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stdout),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stdout),
            )
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }
}
