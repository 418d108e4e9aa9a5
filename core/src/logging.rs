//! Structured request logging.
//!
//! # Design
//! The client describes what it is doing as `LogRecord` values and hands them
//! to a `LogSink`. The default sink forwards to `tracing`; callers that want
//! records elsewhere supply their own. Sinks cannot fail, and `emit` catches
//! panics so a broken sink never changes the outcome of a request.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::Level;

use crate::http::HttpMethod;

/// One structured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub status: Option<u16>,
    pub error: Option<String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            method: None,
            url: None,
            status: None,
            error: None,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    fn record(&self, record: &LogRecord);
}

/// Forwards records to `tracing` under the `request_core` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! forward {
    ($level:expr, $r:expr) => {
        tracing::event!(
            target: "request_core",
            $level,
            method = $r.method.map(HttpMethod::as_str),
            url = $r.url.as_deref(),
            status = $r.status,
            error = $r.error.as_deref(),
            query = ?$r.query,
            headers = ?$r.headers,
            body = $r.body.as_deref(),
            "{}",
            $r.message
        )
    };
}

impl LogSink for TracingSink {
    fn record(&self, r: &LogRecord) {
        // `event!` needs a constant level.
        match r.level {
            Level::ERROR => forward!(Level::ERROR, r),
            Level::WARN => forward!(Level::WARN, r),
            Level::INFO => forward!(Level::INFO, r),
            Level::DEBUG => forward!(Level::DEBUG, r),
            _ => forward!(Level::TRACE, r),
        }
    }
}

/// Hand `record` to `sink`, swallowing any panic raised by the sink.
pub(crate) fn emit(sink: &dyn LogSink, record: &LogRecord) {
    let _ = catch_unwind(AssertUnwindSafe(|| sink.record(record)));
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Collects records in memory.
    #[derive(Default)]
    pub struct CaptureSink {
        pub records: Mutex<Vec<LogRecord>>,
    }

    impl CaptureSink {
        pub fn take(&self) -> Vec<LogRecord> {
            std::mem::take(&mut *self.records.lock().unwrap())
        }
    }

    impl LogSink for CaptureSink {
        fn record(&self, record: &LogRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    /// Panics on every record.
    pub struct PanickingSink;

    impl LogSink for PanickingSink {
        fn record(&self, _record: &LogRecord) {
            panic!("sink exploded");
        }
    }
}
