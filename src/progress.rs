//! Progress reporting for long-running solves.
//!
//! The pipeline reports percentage/stage updates through an explicit
//! sink passed into the invocation — there is no ambient global state.
//! [`NullProgress`] discards updates, [`FnProgress`] adapts a closure,
//! and [`CollectProgress`] records everything for later inspection.

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Completion percentage, 0–100.
    pub percent: u8,
    /// Human-readable stage label.
    pub stage: String,
}

/// Receiver for pipeline progress updates.
pub trait ProgressSink {
    /// Called when the pipeline advances.
    fn update(&mut self, update: ProgressUpdate);
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&mut self, _update: ProgressUpdate) {}
}

/// Adapts a closure into a sink.
#[derive(Debug)]
pub struct FnProgress<F>(pub F);

impl<F: FnMut(ProgressUpdate)> ProgressSink for FnProgress<F> {
    fn update(&mut self, update: ProgressUpdate) {
        (self.0)(update)
    }
}

/// Sink that records every update it receives.
#[derive(Debug, Default, Clone)]
pub struct CollectProgress {
    /// Updates in arrival order.
    pub updates: Vec<ProgressUpdate>,
}

impl ProgressSink for CollectProgress {
    fn update(&mut self, update: ProgressUpdate) {
        self.updates.push(update);
    }
}

pub(crate) fn report(sink: &mut dyn ProgressSink, percent: u8, stage: impl Into<String>) {
    sink.update(ProgressUpdate {
        percent: percent.min(100),
        stage: stage.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink_collects() {
        let mut seen = Vec::new();
        {
            let mut sink = FnProgress(|u: ProgressUpdate| seen.push(u));
            report(&mut sink, 10, "greedy");
            report(&mut sink, 70, "lns");
        }
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].percent, 10);
        assert_eq!(seen[1].stage, "lns");
    }

    #[test]
    fn test_collect_progress() {
        let mut sink = CollectProgress::default();
        report(&mut sink, 5, "start");
        report(&mut sink, 100, "done");
        assert_eq!(sink.updates.len(), 2);
        assert_eq!(sink.updates[1].percent, 100);
    }

    #[test]
    fn test_percent_capped() {
        let mut sink = CollectProgress::default();
        report(&mut sink, 150, "done");
        assert_eq!(sink.updates[0].percent, 100);
    }

    #[test]
    fn test_null_progress() {
        let mut sink = NullProgress;
        report(&mut sink, 50, "anything");
    }
}
