//! Logger abstraction used by the logging middleware.

use tracing::Level;

/// Sink for formatted exchange log lines.
///
/// Closures of the shape `Fn(Level, &str)` are loggers too, which makes it
/// easy to capture log lines in tests.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use grapple::Logger;
/// use tracing::Level;
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&lines);
/// let logger = move |level: Level, message: &str| {
///     sink.lock().unwrap().push((level, message.to_string()));
/// };
///
/// logger.log(Level::INFO, "hello");
/// assert_eq!(lines.lock().unwrap().len(), 1);
/// ```
pub trait Logger: Send + Sync {
    /// Record a message at the given level.
    fn log(&self, level: Level, message: &str);
}

impl<F> Logger for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message);
    }
}

/// Logger forwarding every message to `tracing` under the `grapple::http` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "grapple::http", "{message}"),
            Level::WARN => tracing::warn!(target: "grapple::http", "{message}"),
            Level::INFO => tracing::info!(target: "grapple::http", "{message}"),
            Level::DEBUG => tracing::debug!(target: "grapple::http", "{message}"),
            _ => tracing::trace!(target: "grapple::http", "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn closures_are_loggers() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger: Arc<dyn Logger> = Arc::new(move |level: Level, message: &str| {
            sink.lock()
                .expect("lock")
                .push((level, message.to_string()));
        });

        logger.log(Level::INFO, "first");
        logger.log(Level::WARN, "second");

        let lines = lines.lock().expect("lock");
        assert_eq!(
            *lines,
            vec![
                (Level::INFO, "first".to_string()),
                (Level::WARN, "second".to_string())
            ]
        );
    }

    #[test]
    fn tracing_logger_accepts_every_level() {
        let logger = TracingLogger;
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            logger.log(level, "message");
        }
    }
}
