use ns_core::{Error, Result};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Logging handle handed to crawler components. Every message is emitted
/// through `tracing`, prefixed with the component context it was built with.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    /// A copy of this logger with one more prefix.
    pub fn child(&self, prefix: impl Into<String>) -> Self {
        self.clone().with_prefix(prefix)
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("[{}] ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Install the process subscriber and return the root [`Logger`].
///
/// `RUST_LOG` takes precedence over `level`. With `log_file` set, events are
/// appended to that file instead of stderr. Calling this again after a
/// subscriber is installed only returns a fresh handle.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<Logger> {
    if tracing::dispatcher::has_been_set() {
        return Ok(Logger::new());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::External(anyhow::anyhow!("Invalid log level '{}': {}", level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| Error::External(anyhow::anyhow!("Failed to install log subscriber: {}", e)))?;

    Ok(Logger::new())
}
