//! Loggers for registry notices.

use serde_json::Value;
use std::sync::Arc;
use tidings_core::{Logger, NullLogger};

/// A logger that forwards notices to `tracing` at `INFO` level.
///
/// Without the `tracing` feature notices are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn notice(&self, message: &str, context: &Value, source: &str) {
        #[cfg(feature = "tracing")]
        {
            tracing::info!(source = %source, context = %context, "{message}");
        }

        #[cfg(not(feature = "tracing"))]
        {
            let _ = (message, context, source);
        }
    }
}

/// The logger used when none is configured.
pub fn default_logger() -> Arc<dyn Logger> {
    if cfg!(feature = "tracing") {
        Arc::new(TracingLogger)
    } else {
        Arc::new(NullLogger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notices_never_panic() {
        let logger = default_logger();
        logger.notice("skipped listener", &json!({"key": "x:a"}), "tidings::registry");
        TracingLogger.notice("skipped listener", &Value::Null, "tidings::registry");
    }
}
