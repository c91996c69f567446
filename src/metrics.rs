use std::collections::VecDeque;
use std::time::Instant;

use tracing::debug;

use crate::{
    model::MetricsSnapshot,
    utils::{CHART_WINDOW_SIZE, NETWORK_HISTORY_SIZE},
};

/// Fixed-capacity sample buffer; pushing into a full window evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<T> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.samples.iter().copied()
    }
}

impl RollingWindow<f64> {
    /// Chart points as (index, value).
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect()
    }
}

/// Bytes per second between two readings of a cumulative counter. A zero or
/// negative interval, or a counter that went backwards, yields 0.
pub fn network_rate(previous: u64, current: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() || current < previous {
        return 0.0;
    }
    (current - previous) as f64 / elapsed_secs
}

#[derive(Debug, Clone, Copy)]
struct CounterSample {
    sent: u64,
    recv: u64,
    at: Instant,
}

/// Throughput derived from the backend's cumulative net_sent/net_recv counters.
#[derive(Debug, Clone)]
pub struct NetworkHistory {
    pub rx_rates: RollingWindow<f64>,
    pub tx_rates: RollingWindow<f64>,
    pub total_sent: u64,
    pub total_recv: u64,
    last: Option<CounterSample>,
}

impl NetworkHistory {
    pub fn new() -> Self {
        Self {
            rx_rates: RollingWindow::new(NETWORK_HISTORY_SIZE),
            tx_rates: RollingWindow::new(NETWORK_HISTORY_SIZE),
            total_sent: 0,
            total_recv: 0,
            last: None,
        }
    }

    pub fn update(&mut self, sent: u64, recv: u64, at: Instant) {
        if let Some(prev) = self.last {
            let elapsed = at.saturating_duration_since(prev.at).as_secs_f64();
            self.tx_rates.push(network_rate(prev.sent, sent, elapsed));
            self.rx_rates.push(network_rate(prev.recv, recv, elapsed));
        }
        self.total_sent = sent;
        self.total_recv = recv;
        self.last = Some(CounterSample { sent, recv, at });
    }

    pub fn current_rates(&self) -> (f64, f64) {
        (
            self.rx_rates.latest().unwrap_or(0.0),
            self.tx_rates.latest().unwrap_or(0.0),
        )
    }
}

/// State of the system panel, fed by the poller.
#[derive(Debug)]
pub struct MetricsPanel {
    pub latest: Option<MetricsSnapshot>,
    pub cpu: RollingWindow<f64>,
    pub ram: RollingWindow<f64>,
    pub disk: RollingWindow<f64>,
    pub network: NetworkHistory,
    pub last_error: Option<String>,
    pub last_update: Option<chrono::DateTime<chrono::Local>>,
    in_flight: bool,
    pub process_scroll: usize,
}

impl MetricsPanel {
    pub fn new() -> Self {
        Self {
            latest: None,
            cpu: RollingWindow::new(CHART_WINDOW_SIZE),
            ram: RollingWindow::new(CHART_WINDOW_SIZE),
            disk: RollingWindow::new(CHART_WINDOW_SIZE),
            network: NetworkHistory::new(),
            last_error: None,
            last_update: None,
            in_flight: false,
            process_scroll: 0,
        }
    }

    /// Claim the next poll. False while the previous fetch is still pending.
    pub fn begin_poll(&mut self) -> bool {
        if self.in_flight {
            debug!("metrics poll skipped, previous fetch pending");
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn record(&mut self, snapshot: MetricsSnapshot, at: Instant) {
        self.in_flight = false;
        self.cpu.push(snapshot.cpu_percent);
        self.ram.push(snapshot.ram_percent);
        self.disk.push(snapshot.disk_percent);
        if let (Some(sent), Some(recv)) = (snapshot.net_sent, snapshot.net_recv) {
            self.network.update(sent, recv, at);
        }
        let max_scroll = snapshot.processes.len().saturating_sub(1);
        self.process_scroll = self.process_scroll.min(max_scroll);
        self.latest = Some(snapshot);
        self.last_error = None;
        self.last_update = Some(chrono::Local::now());
    }

    pub fn record_failure(&mut self, message: String) {
        self.in_flight = false;
        self.last_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(cpu: f64) -> MetricsSnapshot {
        serde_json::from_value(serde_json::json!({
            "cpu_percent": cpu, "ram_percent": 20.0, "disk_percent": 30.0,
        }))
        .unwrap()
    }

    #[test]
    fn window_evicts_oldest_after_capacity() {
        let mut window = RollingWindow::new(CHART_WINDOW_SIZE);
        for i in 0..11 {
            window.push(i as f64);
        }
        assert_eq!(window.len(), 10);
        assert!(!window.iter().any(|v| v == 0.0));
        assert_eq!(window.latest(), Some(10.0));
        assert_eq!(window.points()[0], (0.0, 1.0));
    }

    #[test]
    fn rate_is_guarded_against_bad_intervals() {
        assert_eq!(network_rate(100, 300, 2.0), 100.0);
        assert_eq!(network_rate(100, 300, 0.0), 0.0);
        assert_eq!(network_rate(100, 300, -1.0), 0.0);
        assert_eq!(network_rate(500, 100, 2.0), 0.0);
    }

    #[test]
    fn first_network_sample_only_primes_counters() {
        let mut net = NetworkHistory::new();
        let t0 = Instant::now();
        net.update(1000, 2000, t0);
        assert!(net.rx_rates.is_empty());
        net.update(3000, 6000, t0 + Duration::from_secs(2));
        assert_eq!(net.current_rates(), (2000.0, 1000.0));
        assert_eq!(net.total_recv, 6000);
    }

    #[test]
    fn same_instant_samples_give_zero_rate() {
        let mut net = NetworkHistory::new();
        let t0 = Instant::now();
        net.update(0, 0, t0);
        net.update(10, 10, t0);
        assert_eq!(net.current_rates(), (0.0, 0.0));
    }

    #[test]
    fn polls_are_serialized() {
        let mut panel = MetricsPanel::new();
        assert!(panel.begin_poll());
        assert!(!panel.begin_poll());
        panel.record_failure("timeout".into());
        assert_eq!(panel.last_error.as_deref(), Some("timeout"));
        assert!(panel.begin_poll());
        panel.record(snapshot(5.0), Instant::now());
        assert!(panel.last_error.is_none());
        assert!(panel.begin_poll());
    }

    #[test]
    fn every_series_stays_within_window() {
        let mut panel = MetricsPanel::new();
        for i in 0..25 {
            panel.record(snapshot(i as f64), Instant::now());
        }
        assert_eq!(panel.cpu.len(), CHART_WINDOW_SIZE);
        assert_eq!(panel.ram.len(), CHART_WINDOW_SIZE);
        assert_eq!(panel.disk.len(), CHART_WINDOW_SIZE);
        assert_eq!(panel.cpu.iter().next(), Some(15.0));
    }
}
