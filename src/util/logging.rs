// logfind - util/logging.rs
//
// Diagnostic logging for the logfind binary itself (not the loggers it
// manages). Zero overhead when disabled.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug
//   - Config file: [logging] level = "debug"
//
// Output: stderr, so search results on stdout stay clean for piping.

use tracing_subscriber::EnvFilter;

/// Initialise the diagnostic subscriber.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default.
/// Safe to call more than once; later calls are ignored.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            app = super::constants::APP_NAME,
            version = super::constants::APP_VERSION,
            "Logging initialised"
        );
    }
}

/// Shorten a log line for inclusion in debug output.
pub fn preview_line(line: &str) -> &str {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    match trimmed.char_indices().nth(super::constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_line_strips_terminator() {
        assert_eq!(preview_line("abc|def\r\n"), "abc|def");
    }

    #[test]
    fn test_preview_line_caps_length() {
        let long = "x".repeat(1_000);
        assert_eq!(
            preview_line(&long).len(),
            crate::util::constants::DEBUG_MAX_LINE_PREVIEW
        );
    }
}
