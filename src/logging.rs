//! Diagnostic logging on stderr.
//!
//! `--verbose` picks the default level; `RUST_LOG` overrides it when set.
//! Search output always goes to stdout, so logs never mix with results.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Level for a `--verbose` value.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 | 4 => LevelFilter::INFO,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbose).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 5)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::OFF);
        assert_eq!(level_for(1), LevelFilter::ERROR);
        assert_eq!(level_for(2), LevelFilter::WARN);
        assert_eq!(level_for(3), LevelFilter::INFO);
        assert_eq!(level_for(4), LevelFilter::INFO);
        assert_eq!(level_for(5), LevelFilter::TRACE);
        assert_eq!(level_for(u8::MAX), LevelFilter::TRACE);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(1);
        init(5);
    }
}
