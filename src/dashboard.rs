// src/dashboard.rs
//! The poller/renderer controller.
//!
//! A `Dashboard` is owned by a single event loop. Network calls run as
//! spawned tasks and report back as [`Event`]s on the channel returned by
//! [`Dashboard::new`]; timer ticks arrive on the same channel. The loop feeds
//! every event to [`Dashboard::handle`], so all rendering happens on the
//! owner, one event at a time, in arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::charts::{self, ChartState, StatsView};
use crate::config::PollingConfig;
use crate::history;
use crate::model::{CurrentStats, LiveData, RetrainReply, StatsSnapshot};
use crate::network::{ApiError, DashboardApi};
use crate::render::{Banner, BannerKind, ChartId, Renderer};
use crate::scheduler::Timers;

pub const LIVE_FALLBACK: &str = "Failed to fetch live data";
pub const RETRAIN_FALLBACK: &str = "Failed to retrain model";
pub const RETRAIN_OK: &str = "Model retrained successfully!";

#[derive(Debug)]
pub enum Event {
    LiveTick,
    StatsTick,
    Live(Result<LiveData, ApiError>),
    Stats(Result<CurrentStats, ApiError>),
    Retrain(Result<RetrainReply, ApiError>),
}

struct Charts {
    status: ChartState,
    hourly: ChartState,
    flow: ChartState,
    protocol: ChartState,
}

impl Charts {
    fn placeholders() -> Self {
        Charts {
            status: ChartState::new(
                "Packet Status Distribution",
                vec!["Normal Packets".into(), "Anomaly Packets".into()],
                &["Packets"],
            ),
            hourly: ChartState::new(
                "24-Hour Packet Analysis",
                charts::hourly_labels(),
                &["Normal Packets", "Anomaly Packets"],
            ),
            flow: ChartState::new("Real-time Packet Flow", Vec::new(), &["Packets per Minute"]),
            protocol: ChartState::new("Protocol Distribution", Vec::new(), &["Packet Count"]),
        }
    }

    fn get(&self, id: ChartId) -> &ChartState {
        match id {
            ChartId::Status => &self.status,
            ChartId::Hourly => &self.hourly,
            ChartId::Flow => &self.flow,
            ChartId::Protocol => &self.protocol,
        }
    }

    fn release(&mut self) {
        self.status.clear();
        self.hourly.clear();
        self.flow.clear();
        self.protocol.clear();
    }
}

pub struct Dashboard<R: Renderer> {
    api: Arc<dyn DashboardApi>,
    renderer: R,
    events: UnboundedSender<Event>,
    polling: PollingConfig,
    charts: Charts,
    live_in_flight: Arc<AtomicBool>,
    timers: Option<Timers>,
    torn_down: bool,
}

impl<R: Renderer> Dashboard<R> {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        renderer: R,
        polling: PollingConfig,
    ) -> (Self, UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let dashboard = Dashboard {
            api,
            renderer,
            events,
            polling,
            charts: Charts::placeholders(),
            live_in_flight: Arc::new(AtomicBool::new(false)),
            timers: None,
            torn_down: false,
        };
        (dashboard, rx)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn chart(&self, id: ChartId) -> &ChartState {
        self.charts.get(id)
    }

    pub fn live_in_flight(&self) -> bool {
        self.live_in_flight.load(Ordering::SeqCst)
    }

    pub fn auto_refresh(&self) -> bool {
        self.timers.is_some()
    }

    /// Tokens of the running timers, `(live, stats)`.
    pub fn timer_tokens(&self) -> Option<(CancellationToken, CancellationToken)> {
        self.timers
            .as_ref()
            .map(|t| (t.live.cancellation_token(), t.stats.cancellation_token()))
    }

    /// Draws the empty charts, fetches once and starts both timers.
    pub fn initialize(&mut self) {
        info!(
            live_ms = self.polling.live_interval_ms,
            stats_ms = self.polling.stats_interval_ms,
            "dashboard starting"
        );
        for id in [ChartId::Status, ChartId::Hourly, ChartId::Flow, ChartId::Protocol] {
            self.renderer.render_chart(id, self.charts.get(id));
        }
        self.poll_live_data();
        self.start_timers();
    }

    /// Starts a live-data fetch unless one is already outstanding.
    /// Returns whether a request was issued.
    pub fn poll_live_data(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        if self.live_in_flight.swap(true, Ordering::SeqCst) {
            debug!("live-data poll skipped, previous request still in flight");
            return false;
        }
        let api = self.api.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.live_data().await;
            let _ = tx.send(Event::Live(result));
        });
        true
    }

    /// Fetches the lightweight counters. No in-flight guard.
    pub fn poll_stats(&mut self) {
        if self.torn_down {
            return;
        }
        let api = self.api.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.current_stats().await;
            let _ = tx.send(Event::Stats(result));
        });
    }

    /// Posts a retrain request. Nothing prevents a second submission while
    /// the first is pending; each completion re-enables the control.
    pub fn retrain_model(&mut self) {
        if self.torn_down {
            return;
        }
        info!("retrain requested");
        self.renderer.set_retrain_busy(true);
        let api = self.api.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.retrain_model().await;
            let _ = tx.send(Event::Retrain(result));
        });
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        if enabled {
            self.start_timers();
        } else {
            self.stop_timers();
        }
    }

    fn start_timers(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_timers();
        let live_tx = self.events.clone();
        let stats_tx = self.events.clone();
        self.timers = Some(Timers::start(
            self.polling.live_interval(),
            move || {
                let _ = live_tx.send(Event::LiveTick);
            },
            self.polling.stats_interval(),
            move || {
                let _ = stats_tx.send(Event::StatsTick);
            },
        ));
        self.renderer.set_auto_refresh(true);
    }

    fn stop_timers(&mut self) {
        if let Some(timers) = self.timers.take() {
            timers.stop();
            self.renderer.set_auto_refresh(false);
        }
    }

    pub fn handle(&mut self, event: Event) {
        self.handle_at(event, Local::now().naive_local());
    }

    /// Applies one event with `now` as the reference time for bucketing.
    pub fn handle_at(&mut self, event: Event, now: NaiveDateTime) {
        if self.torn_down {
            return;
        }
        match event {
            Event::LiveTick => {
                self.poll_live_data();
            }
            Event::StatsTick => self.poll_stats(),
            Event::Live(result) => {
                match result {
                    Ok(live) => self.render_live(&live, now),
                    Err(e) => {
                        error!(error = %e, "error fetching live data");
                        self.banner(BannerKind::Error, e.banner_text(LIVE_FALLBACK));
                    }
                }
                self.live_in_flight.store(false, Ordering::SeqCst);
            }
            Event::Stats(result) => match result {
                Ok(current) => {
                    self.render_stats(&current.stats);
                    self.renderer.render_queue(current.queue_size);
                }
                Err(e) => warn!(error = %e, "error fetching current stats"),
            },
            Event::Retrain(result) => {
                match result {
                    Ok(reply) => {
                        info!(reply = reply.message.as_deref().unwrap_or(""), "model retrained");
                        self.banner(BannerKind::Success, RETRAIN_OK);
                        self.poll_live_data();
                    }
                    Err(e) => {
                        error!(error = %e, "error retraining model");
                        self.banner(BannerKind::Error, e.banner_text(RETRAIN_FALLBACK));
                    }
                }
                self.renderer.set_retrain_busy(false);
            }
        }
    }

    fn banner(&mut self, kind: BannerKind, message: impl Into<String>) {
        let ttl = self.polling.banner_ttl();
        self.renderer.show_banner(Banner::new(kind, message, ttl));
    }

    fn render_stats(&mut self, stats: &StatsSnapshot) {
        self.renderer.render_stats(&StatsView::from(stats));
        self.charts
            .status
            .set_series(0, &[stats.normal_packets, stats.anomaly_packets]);
        self.renderer.render_chart(ChartId::Status, &self.charts.status);
    }

    fn render_live(&mut self, live: &LiveData, now: NaiveDateTime) {
        self.render_stats(&live.stats);

        if let Some(records) = live.recent_data.as_deref() {
            self.renderer.render_table(&charts::recent_rows(records));

            let flow = &mut self.charts.flow;
            flow.set_labels(charts::flow_labels(now));
            flow.set_series(0, &charts::flow_counts(records, now));
            self.renderer.render_chart(ChartId::Flow, &self.charts.flow);

            let (names, counts): (Vec<String>, Vec<u64>) =
                charts::protocol_tally(records).into_iter().unzip();
            let protocol = &mut self.charts.protocol;
            protocol.set_labels(names);
            protocol.set_series(0, &counts);
            self.renderer.render_chart(ChartId::Protocol, &self.charts.protocol);

            self.renderer.render_history(&history::anomaly_rows(records));
        }

        if let Some(buckets) = live.hourly_stats.as_deref() {
            let (normal, anomaly) = charts::hourly_series(buckets);
            let hourly = &mut self.charts.hourly;
            hourly.set_series(0, &normal);
            hourly.set_series(1, &anomaly);
            self.renderer.render_chart(ChartId::Hourly, &self.charts.hourly);
        }

        self.renderer
            .render_last_updated(&now.format("%H:%M:%S").to_string());
    }

    /// Cancels both timers and releases chart resources. Runs once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_timers();
        self.charts.release();
        self.renderer.release();
        self.torn_down = true;
        info!("dashboard torn down");
    }
}
