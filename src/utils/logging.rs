use anyhow::Error;
use tracing::span::Span;

pub trait LogError {
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    /// Logs the error inside the span, so that it carries the context of the event that caused it.
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Error: {error:?}");
        });
    }
}
