//! Minimal metrics registry for the client.
//!
//! Counter and gauge types with dynamic labels backed by `DashMap`. Labels are
//! flattened into sorted key vectors to keep deterministic ordering.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<Vec<(String, String)>, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct ClientMetrics {
    pub feed_snapshots: CounterVec,
    pub feed_rejected_documents: CounterVec,
    pub feed_reconnects: CounterVec,
    pub feeds_active: GaugeVec,
    pub message_sends: CounterVec,
    pub message_send_failures: CounterVec,
    pub auth_failures: CounterVec,
    pub profile_update_failures: CounterVec,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all registered metrics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.feed_snapshots.render("ummah_feed_snapshots_total", &mut out);
        self.feed_rejected_documents.render("ummah_feed_rejected_documents_total", &mut out);
        self.feed_reconnects.render("ummah_feed_reconnects_total", &mut out);
        self.feeds_active.render("ummah_feeds_active", &mut out);
        self.message_sends.render("ummah_message_sends_total", &mut out);
        self.message_send_failures.render("ummah_message_send_failures_total", &mut out);
        self.auth_failures.render("ummah_auth_failures_total", &mut out);
        self.profile_update_failures.render("ummah_profile_update_failures_total", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_order_does_not_matter() {
        let c = CounterVec::default();
        c.inc(&[("channel", "islam-chat"), ("op", "send")]);
        c.inc(&[("op", "send"), ("channel", "islam-chat")]);
        assert_eq!(c.get(&[("channel", "islam-chat"), ("op", "send")]), 2);
    }

    #[test]
    fn render_escapes_labels() {
        let m = ClientMetrics::new();
        m.feeds_active.inc(&[("channel", "a\"b")]);
        let out = m.render();
        assert!(out.contains("ummah_feeds_active{channel=\"a\\\"b\"} 1"));
        assert!(out.contains("# TYPE ummah_message_sends_total counter"));
    }
}
