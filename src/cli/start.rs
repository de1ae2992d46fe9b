use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Repeated `-v` flags widen the log level; zero flags means errors only,
/// which telemetry applies as its default.
const fn get_verbosity_level(verbosity: u8) -> Option<tracing::Level> {
    match verbosity {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse the command line, bring up logging, and return the action for the
/// binary to run.
///
/// # Errors
///
/// Returns an error if telemetry setup or dispatch fails; argument errors
/// exit via clap before reaching this point.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity_level =
        get_verbosity_level(matches.get_one::<u8>("verbosity").copied().unwrap_or(0));

    // Logging must be live before dispatch so action setup is traceable.
    telemetry::init(verbosity_level)?;

    dispatch::handler(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn verbosity_widens_with_each_flag() {
        assert_eq!(get_verbosity_level(0), None);
        assert_eq!(get_verbosity_level(1), Some(Level::WARN));
        assert_eq!(get_verbosity_level(2), Some(Level::INFO));
        assert_eq!(get_verbosity_level(3), Some(Level::DEBUG));
    }

    #[test]
    fn verbosity_saturates_at_trace() {
        for count in [4, 5, u8::MAX] {
            assert_eq!(get_verbosity_level(count), Some(Level::TRACE));
        }
    }
}
