//! Tracing setup: structured logging to stderr with span helpers.

pub mod spans;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `sitegate=debug`.
pub const LOG_ENV: &str = "SITEGATE_LOG";

/// Environment variable selecting the log format; `json` switches to JSON lines.
pub const LOG_FORMAT_ENV: &str = "SITEGATE_LOG_FORMAT";

/// Initialize the global subscriber.
///
/// Logs go to stderr so stdout stays reserved for the report. Defaults to
/// `warn` when `SITEGATE_LOG` is unset. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
