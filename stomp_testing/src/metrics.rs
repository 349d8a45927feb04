//! Snapshot helpers over `metrics_util`'s debugging recorder.

use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};

/// Creates a debugging recorder and its snapshotter.
#[must_use]
pub fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

/// Metric values captured at one instant.
pub struct MetricsSnapshot {
    entries: Vec<(CompositeKey, DebugValue)>,
}

impl MetricsSnapshot {
    /// Capture the current values recorded by `snapshotter`.
    #[must_use]
    pub fn take(snapshotter: &Snapshotter) -> Self {
        let entries = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, value)| (key, value))
            .collect();
        Self { entries }
    }

    /// Value of the counter `name`, optionally restricted to one label pair.
    ///
    /// Returns zero when the counter was never touched.
    #[must_use]
    pub fn counter(&self, name: &str, label: Option<(&str, &str)>) -> u64 {
        self.entries
            .iter()
            .filter(|(key, _)| {
                key.key().name() == name
                    && label.is_none_or(|(label_key, label_value)| {
                        key.key()
                            .labels()
                            .any(|l| l.key() == label_key && l.value() == label_value)
                    })
            })
            .map(|(_, value)| match value {
                DebugValue::Counter(count) => *count,
                _ => 0,
            })
            .sum()
    }

    /// Value of the gauge `name`, if it was recorded.
    #[must_use]
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.entries.iter().find_map(|(key, value)| match value {
            DebugValue::Gauge(gauge) if key.key().name() == name => Some(gauge.into_inner()),
            _ => None,
        })
    }
}
