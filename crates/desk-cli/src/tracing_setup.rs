//! Tracing subscriber initialization for the `desk` binary.
//!
//! Logs go to stderr so command output on stdout stays machine readable.
//!
//! # Priority (highest to lowest)
//!
//! 1. `DESK_LOG` env var (per-target directives, e.g. `desk_resolver=trace,warn`)
//! 2. `RUST_LOG` env var
//! 3. `--debug` flag: debug for the desk crates, warn elsewhere
//! 4. Default level: `warn`

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Project-specific filter variable
pub const DESK_LOG_VAR: &str = "DESK_LOG";

const DEBUG_DIRECTIVES: &str = "desk_cli=debug,desk_resolver=debug,desk_structure=debug,desk_router=debug,warn";
const DEFAULT_DIRECTIVES: &str = "warn";

/// Initialize the global tracing subscriber.
///
/// Call once, before any command runs. A second call leaves the first
/// subscriber in place.
pub fn init_subscriber(debug: bool) {
    let directives = select_directives(
        debug,
        std::env::var(DESK_LOG_VAR).ok().as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
    );
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(stderr_is_tty)
        .with_target(true)
        .with_level(true);

    let installed = if debug {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.with_timer(fmt::time::uptime()))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time().compact())
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Pick filter directives; unparseable env values fall through to the next source
#[must_use]
pub fn select_directives(debug: bool, desk_log: Option<&str>, rust_log: Option<&str>) -> String {
    for candidate in [desk_log, rust_log].into_iter().flatten() {
        if !candidate.trim().is_empty() && EnvFilter::try_new(candidate).is_ok() {
            return candidate.to_string();
        }
    }
    if debug {
        DEBUG_DIRECTIVES.to_string()
    } else {
        DEFAULT_DIRECTIVES.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desk_log_wins() {
        assert_eq!(select_directives(true, Some("desk_router=trace"), Some("info")), "desk_router=trace");
    }

    #[test]
    fn rust_log_before_flag() {
        assert_eq!(select_directives(true, None, Some("info")), "info");
    }

    #[test]
    fn invalid_env_falls_through() {
        assert_eq!(select_directives(false, Some("desk=loud"), None), DEFAULT_DIRECTIVES);
    }

    #[test]
    fn debug_flag_raises_desk_crates() {
        let directives = select_directives(true, None, None);
        assert!(directives.contains("desk_resolver=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
        assert_eq!(select_directives(false, None, Some("")), "warn");
    }
}
