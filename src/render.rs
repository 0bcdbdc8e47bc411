// src/render.rs
use std::time::{Duration, Instant};

use crate::charts::{ChartState, EventRow, StatsView};

/// Default lifetime of a transient banner.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    /// Normal vs. anomaly split of the current counters.
    Status,
    Hourly,
    Flow,
    Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub raised_at: Instant,
    pub ttl: Duration,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>, ttl: Duration) -> Self {
        Banner {
            kind,
            message: message.into(),
            raised_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < self.ttl
    }
}

/// Display capability the dashboard drives. The terminal binding lives in
/// `ui`; tests use a recording implementation.
pub trait Renderer {
    fn render_stats(&mut self, stats: &StatsView);
    fn render_table(&mut self, rows: &[EventRow]);
    fn render_chart(&mut self, id: ChartId, chart: &ChartState);
    fn show_banner(&mut self, banner: Banner);

    /// Anomaly-history rows, newest first.
    fn render_history(&mut self, _rows: &[EventRow]) {}
    fn render_queue(&mut self, _queue_size: u64) {}
    fn render_last_updated(&mut self, _at: &str) {}
    fn set_retrain_busy(&mut self, _busy: bool) {}
    fn set_auto_refresh(&mut self, _enabled: bool) {}
    /// Drop chart resources. Called once on teardown.
    fn release(&mut self) {}
}
