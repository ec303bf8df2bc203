//! Request tracing utilities.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{field, info_span, Instrument, Span};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Create a span covering one logical request, redirects included.
///
/// `status`, `redirects` and `error` are recorded later.
pub fn request_span(method: &str, url: &str) -> Span {
    let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
    info_span!(
        "request",
        id,
        method = %method,
        url = %url,
        status = field::Empty,
        redirects = field::Empty,
        error = field::Empty,
    )
}

/// Create a span for one attempt of a request.
pub fn attempt_span(depth: u32, url: &str) -> Span {
    tracing::debug_span!("attempt", depth, url = %url)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Complete the timer, log and return the elapsed time.
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

/// Macro for timing a block of code.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let _timer = $crate::spans::Timer::start($name);
        let result = $body;
        _timer.finish();
        result
    }};
}
