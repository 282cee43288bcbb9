//! Tracing subscriber initialization.
//!
//! # Usage
//!
//! ```no_run
//! // Warnings only, human-readable
//! opsdesk_observe::tracing_setup::init_tracing(0, false, false).unwrap();
//!
//! // Debug logs for opsdesk crates, one JSON object per line
//! opsdesk_observe::tracing_setup::init_tracing(1, false, true).unwrap();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directives for a `-v` count.
pub fn filter_directives(verbosity: u8, quiet: bool) -> &'static str {
    match verbosity {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,opsdesk=debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the verbosity-derived filter when it is set. Logs go
/// to stderr so command output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init_tracing(
    verbosity: u8,
    quiet: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(filter_directives(verbosity, quiet)),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(0, true), "error");
        assert_eq!(filter_directives(0, false), "warn");
        assert_eq!(filter_directives(1, true), "info,opsdesk=debug");
        assert_eq!(filter_directives(3, false), "trace");
    }
}
