//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the computed log filter
pub const LOG_ENV: &str = "MURP_LOG";

/// Pick the default filter directive from the verbosity flags
pub fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install a stderr subscriber. Calling twice is harmless.
pub fn init_tracing(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbose() {
        assert_eq!(default_level(true, true), "error");
        assert_eq!(default_level(false, true), "debug");
        assert_eq!(default_level(false, false), "warn");
    }
}
