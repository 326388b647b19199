//! Log subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter directive for the given verbosity flags.
///
/// `quiet` wins over everything; otherwise `-v` enables debug, `-vv` trace,
/// and `debug` from the config file forces at least debug.
pub fn directive(quiet: bool, verbosity: u8, debug: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match (verbosity, debug) {
        (v, _) if v >= 2 => "warn,stillwave=trace",
        (1, _) | (_, true) => "warn,stillwave=debug",
        _ => "warn,stillwave=info",
    }
}

/// Install a stderr fmt subscriber. `RUST_LOG` overrides the flags.
pub fn init(quiet: bool, verbosity: u8, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(quiet, verbosity, debug)));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed; keep it
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(directive(true, 2, true), "error");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(directive(false, 0, false), "warn,stillwave=info");
        assert_eq!(directive(false, 1, false), "warn,stillwave=debug");
        assert_eq!(directive(false, 2, false), "warn,stillwave=trace");
    }

    #[test]
    fn config_debug_forces_debug() {
        assert_eq!(directive(false, 0, true), "warn,stillwave=debug");
        assert_eq!(directive(false, 3, true), "warn,stillwave=trace");
    }
}
