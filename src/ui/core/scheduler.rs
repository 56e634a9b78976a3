//! Periodic refresh of every market feed.
//!
//! The scheduler runs as its own task next to the UI. It owns the refresh
//! timer, fetches all feeds of a cycle concurrently and applies each result
//! on its own, so one failing endpoint never blanks the others. The UI talks
//! to it through [`SchedulerCommand`]s and hears back through
//! [`SchedulerEvent`]s.

use chrono::{DateTime, Local};
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::alerts::NotificationGate;
use super::alerts::Notifier;
use super::state::{lock, SharedState};
use crate::api::client::MarketApi;
use crate::api::Feed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    SetEnabled(bool),
    ToggleEnabled,
    /// Fetch everything now and restart the interval from this moment.
    RefreshNow,
    LoadChart(String),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// Whole seconds until the next automatic refresh, `None` while paused.
    Countdown(Option<u64>),
    BatchFinished {
        failed: Vec<Feed>,
        at: DateTime<Local>,
    },
    ChartLoaded(String),
    Toast(Toast),
}

pub struct RefreshScheduler {
    api: Arc<dyn MarketApi>,
    state: SharedState,
    interval: Duration,
    enabled: bool,
    events: UnboundedSender<SchedulerEvent>,
    commands: UnboundedReceiver<SchedulerCommand>,
    notifier: Box<dyn Notifier>,
}

impl RefreshScheduler {
    pub fn new(
        api: Arc<dyn MarketApi>,
        state: SharedState,
        interval: Duration,
        events: UnboundedSender<SchedulerEvent>,
        commands: UnboundedReceiver<SchedulerCommand>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            state,
            interval,
            enabled: true,
            events,
            commands,
            notifier,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn emit(&self, event: SchedulerEvent) {
        // The UI may already be gone during shutdown.
        let _ = self.events.send(event);
    }

    fn toast(&self, level: ToastLevel, message: String) {
        self.emit(SchedulerEvent::Toast(Toast::new(level, message)));
    }

    fn seconds_until(&self, deadline: Instant) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        Some(left.as_secs() + u64::from(left.subsec_nanos() > 0))
    }

    /// Runs until `Shutdown` arrives or the command channel closes.
    pub async fn run(mut self) {
        info!(
            "Refresh scheduler started, interval {}s",
            self.interval.as_secs()
        );

        self.run_batch().await;
        self.load_selected_chart().await;

        let mut next_fetch = Instant::now() + self.interval;
        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = time::sleep_until(next_fetch), if self.enabled => {
                    self.run_batch().await;
                    next_fetch += self.interval;
                    if next_fetch <= Instant::now() {
                        next_fetch = Instant::now() + self.interval;
                    }
                }
                _ = ticker.tick() => {
                    self.emit(SchedulerEvent::Countdown(self.seconds_until(next_fetch)));
                }
                command = self.commands.recv() => {
                    debug!("Scheduler command: {:?}", command);
                    match command {
                        Some(SchedulerCommand::Shutdown) | None => break,
                        Some(SchedulerCommand::SetEnabled(on)) => self.set_enabled(on, &mut next_fetch),
                        Some(SchedulerCommand::ToggleEnabled) => {
                            let on = !self.enabled;
                            self.set_enabled(on, &mut next_fetch);
                        }
                        Some(SchedulerCommand::RefreshNow) => {
                            self.run_batch().await;
                            next_fetch = Instant::now() + self.interval;
                        }
                        Some(SchedulerCommand::LoadChart(coin_id)) => self.load_chart(&coin_id).await,
                    }
                    self.emit(SchedulerEvent::Countdown(self.seconds_until(next_fetch)));
                }
            }
        }

        info!("Refresh scheduler stopped");
    }

    fn set_enabled(&mut self, on: bool, next_fetch: &mut Instant) {
        if on == self.enabled {
            return;
        }
        self.enabled = on;
        if on {
            *next_fetch = Instant::now() + self.interval;
            info!("Auto refresh resumed");
        } else {
            info!("Auto refresh paused");
        }
    }

    /// Fetches every feed concurrently and applies each result on its own.
    /// Returns the feeds that failed.
    pub async fn run_batch(&mut self) -> Vec<Feed> {
        debug!("Refreshing {} feeds", Feed::ALL.len());

        let fetches = Feed::ALL.iter().map(|&feed| {
            let api = Arc::clone(&self.api);
            async move { (feed, api.fetch_feed(feed).await) }
        });
        let results = join_all(fetches).await;

        let now = Local::now();
        let mut failed = Vec::new();
        {
            let mut state = lock(&self.state);
            for (feed, result) in results {
                match result {
                    Ok(payload) => state.set_feed(payload),
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", feed.as_str(), e);
                        failed.push(feed);
                    }
                }
            }
            state.mark_refreshed(now);

            // A failed coin fetch leaves the previous prices in place.
            let fired = state.evaluate_alerts();
            if !fired.is_empty() {
                let mut gate = NotificationGate::new(state.prefs().notification_permission);
                if gate.dispatch(&fired, self.notifier.as_mut()) {
                    state.set_notification_permission(gate.permission());
                }
            }
        }

        if failed.is_empty() {
            debug!("All feeds refreshed");
        } else {
            let names: Vec<&str> = failed.iter().map(|f| f.as_str()).collect();
            self.toast(
                ToastLevel::Warning,
                format!("Could not refresh: {}", names.join(", ")),
            );
        }

        self.emit(SchedulerEvent::BatchFinished {
            failed: failed.clone(),
            at: now,
        });
        failed
    }

    async fn load_selected_chart(&mut self) {
        let selected = lock(&self.state).view_state().selected_coin_id.clone();
        if let Some(coin_id) = selected {
            self.load_chart(&coin_id).await;
        }
    }

    /// Loads OHLC, signal and detail for one coin. A failed OHLC fetch keeps
    /// whatever chart was shown before.
    pub async fn load_chart(&mut self, coin_id: &str) {
        let api = Arc::clone(&self.api);
        let (ohlc, signal, detail) = tokio::join!(
            api.ohlc(coin_id),
            api.coin_signal(coin_id),
            api.coin_detail(coin_id)
        );

        let points = match ohlc {
            Ok(points) => points,
            Err(e) => {
                warn!("Failed to load chart for {}: {}", coin_id, e);
                self.toast(
                    ToastLevel::Warning,
                    format!("Chart for {} unavailable: {}", coin_id, e),
                );
                return;
            }
        };
        let signal = signal
            .map_err(|e| debug!("No signal for {}: {}", coin_id, e))
            .ok();
        let detail = detail
            .map_err(|e| debug!("No detail for {}: {}", coin_id, e))
            .ok();

        let result = {
            let mut state = lock(&self.state);
            if state.view_state().selected_coin_id.as_deref() != Some(coin_id) {
                debug!("Dropping chart for {}, no longer selected", coin_id);
                return;
            }
            state.set_ohlc(coin_id, points).map(|()| {
                state.set_chart_extras(coin_id, signal, detail);
            })
        };

        match result {
            Ok(()) => self.emit(SchedulerEvent::ChartLoaded(coin_id.to_string())),
            Err(e) => {
                warn!("Chart for {} not updated: {}", coin_id, e);
                self.toast(
                    ToastLevel::Warning,
                    format!("No chart data for {}", coin_id),
                );
            }
        }
    }
}
