//! Progress reporting shared by timeline builds and the transport.

use std::sync::{Arc, Mutex};

/// Pluggable progress handler.
///
/// Receives a percentage in `[0, 100]` and a human-readable description: the
/// build step while a timeline is generated, the current timing mark while
/// it plays.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percentage: f64, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f64, &str) + Send + Sync,
{
    fn report(&self, percentage: f64, message: &str) {
        self(percentage, message)
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _percentage: f64, _message: &str) {}
}

/// Forwards reports to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&self, percentage: f64, message: &str) {
        tracing::debug!(percentage, "{}", message);
    }
}

/// Collects reports in memory. Useful for tests and batch callers.
#[derive(Debug, Clone, Default)]
pub struct CollectorSink {
    reports: Arc<Mutex<Vec<(f64, String)>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<(f64, String)> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<(f64, String)> {
        self.reports.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl ProgressSink for CollectorSink {
    fn report(&self, percentage: f64, message: &str) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((percentage, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn collector_records_in_order() {
        let sink = CollectorSink::new();
        sink.report(10.0, "first");
        sink.report(20.0, "second");

        assert_eq!(
            sink.reports(),
            vec![(10.0, "first".to_string()), (20.0, "second".to_string())]
        );
        assert_eq!(sink.last(), Some((20.0, "second".to_string())));
    }

    #[test]
    fn closures_are_sinks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sink = move |_: f64, _: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        };

        sink.report(1.0, "a");
        sink.report(2.0, "b");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sinks_are_usable_as_trait_objects() {
        let collector = CollectorSink::new();
        let sinks: Vec<Arc<dyn ProgressSink>> =
            vec![Arc::new(LogSink), Arc::new(NullSink), Arc::new(collector.clone())];
        for sink in &sinks {
            sink.report(75.0, "Generating audio for sentence 3 of 4");
        }
        assert_eq!(collector.reports().len(), 1);
    }

    #[test]
    fn null_sink_is_silent() {
        NullSink.report(50.0, "ignored");
    }
}
