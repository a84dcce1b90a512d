// ABOUTME: Shared logging setup for all bytedge binaries
// ABOUTME: Two functions: init() for stderr, init_file() for interactive sessions

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
/// Used by one-shot CLI commands.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// File-based logging for interactive sessions. Default: WARN level, RUST_LOG override.
/// Logs to ~/.config/bytedge/{app_name}/{app_name}.log
/// If setup fails, prints a warning to stderr and continues without logging.
pub fn init_file(app_name: &str) {
    if let Err(e) = init_file_inner(app_name) {
        eprintln!("Warning: failed to set up file logging: {e}");
    }
}

/// Where `init_file` writes for the given app, if a config directory exists.
pub fn log_path(app_name: &str) -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(
        config_dir
            .join("bytedge")
            .join(app_name)
            .join(format!("{app_name}.log")),
    )
}

fn init_file_inner(app_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = log_path(app_name).ok_or("could not determine config directory")?;
    if let Some(log_dir) = path.parent() {
        std::fs::create_dir_all(log_dir)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_ansi(false)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn exports_init() {
        let _ = super::init as fn();
    }

    #[test]
    fn exports_init_file() {
        let _ = super::init_file as fn(&str);
    }

    #[test]
    fn log_path_is_scoped_by_app_name() {
        if let Some(path) = super::log_path("chat") {
            assert!(path.ends_with("bytedge/chat/chat.log"));
        }
    }
}
