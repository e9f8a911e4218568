//! Engine statistics: built-in lifecycle counters plus caller-recorded
//! counters keyed by stat elements and tags.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Counter table for one engine instance.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub streams_started: AtomicU64,
    pub streams_completed: AtomicU64,
    pub streams_reset: AtomicU64,
    pub streams_errored: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    counters: DashMap<String, AtomicU64>,
}

/// Point-in-time copy of an engine's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub streams_started: u64,
    pub streams_completed: u64,
    pub streams_reset: u64,
    pub streams_errored: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Caller-recorded counters, sorted by name.
    pub counters: Vec<(String, u64)>,
}

impl EngineStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to the counter named by `elements` and `tags`.
    pub fn record_counter(&self, elements: &str, tags: &[(String, String)], count: u64) {
        let key = Self::counter_key(elements, tags);
        self.counters
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(count, Ordering::Relaxed);
    }

    fn counter_key(elements: &str, tags: &[(String, String)]) -> String {
        if tags.is_empty() {
            return elements.to_string();
        }
        let rendered: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{elements}{{{}}}", rendered.join(","))
    }

    /// Create a snapshot of current statistics.
    #[must_use]
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        let mut counters: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|e| (e.key().clone(), e.value().load(Ordering::Relaxed)))
            .collect();
        counters.sort_by(|a, b| a.0.cmp(&b.0));
        EngineStatsSnapshot {
            streams_started: self.streams_started.load(Ordering::Relaxed),
            streams_completed: self.streams_completed.load(Ordering::Relaxed),
            streams_reset: self.streams_reset.load(Ordering::Relaxed),
            streams_errored: self.streams_errored.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            counters,
        }
    }

    /// Renders every active stat as `name: value` lines.
    #[must_use]
    pub fn dump(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();
        out.push_str(&format!("streams.started: {}\n", snapshot.streams_started));
        out.push_str(&format!(
            "streams.completed: {}\n",
            snapshot.streams_completed
        ));
        out.push_str(&format!("streams.reset: {}\n", snapshot.streams_reset));
        out.push_str(&format!("streams.errored: {}\n", snapshot.streams_errored));
        out.push_str(&format!("bytes.sent: {}\n", snapshot.bytes_sent));
        out.push_str(&format!("bytes.received: {}\n", snapshot.bytes_received));
        for (name, value) in snapshot.counters {
            out.push_str(&format!("{name}: {value}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_by_key() {
        let stats = EngineStats::new();
        stats.record_counter("requests.total", &[], 1);
        stats.record_counter("requests.total", &[], 2);
        let tags = vec![("cluster".to_string(), "edge".to_string())];
        stats.record_counter("requests.total", &tags, 5);

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot.counters,
            vec![
                ("requests.total".to_string(), 3),
                ("requests.total{cluster=edge}".to_string(), 5),
            ]
        );
    }

    #[test]
    fn dump_renders_builtin_counters() {
        let stats = EngineStats::new();
        stats.streams_started.store(4, Ordering::Relaxed);
        let dump = stats.dump();
        assert!(dump.contains("streams.started: 4"));
        assert!(dump.contains("bytes.sent: 0"));
    }
}
