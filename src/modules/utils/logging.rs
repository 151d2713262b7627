use env_logger::{Builder, WriteStyle};
use log::{debug, info, warn, LevelFilter};

/// Initialize the logging system on stderr at the given level.
///
/// `RUST_LOG` still overrides the level. Calling this twice is harmless.
pub fn initialize_logging(level: LevelFilter) {
    let result = Builder::new()
        // Set default log level
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto)
        .try_init();

    if result.is_ok() {
        info!("Logging system initialized");
    }
}

/// Helper function to format sensitive data for logging
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Structured logging for configuration events
pub fn log_config_event(
    operation: &str,
    username: &str,
    host: &str,
    success: bool,
    details: Option<&str>,
) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        debug!(
            "Config event: op={}, user={}, host={}, success=true, timestamp={}, details={:?}",
            operation,
            format_sensitive(username),
            host,
            timestamp,
            details
        );
    } else {
        warn!(
            "Config event: op={}, user={}, host={}, success=false, timestamp={}, details={:?}",
            operation,
            format_sensitive(username),
            host,
            timestamp,
            details
        );
    }
}
