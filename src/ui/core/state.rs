//! The dashboard's single source of truth.
//!
//! `DashboardState` owns the latest snapshot of every feed plus all UI-only
//! state. Feed fields are written by the refresh scheduler, everything else
//! by [`Command`]s coming from the UI. Views are derived on demand and never
//! cached.

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use super::alerts::{self, AlertEngine, AlertRetention, Direction, FiredAlert, Permission, PriceAlert};
use super::indicators::{IndicatorConfig, IndicatorSeries};
use super::simulator::{self, Affordability, DreamResult, InputMode, ReferenceItem};
use super::storage::{
    self, Storage, KEY_ALERTS, KEY_CONSENT, KEY_LANGUAGE, KEY_NOTIFICATION_PERMISSION, KEY_THEME,
    KEY_WATCHLIST,
};
use crate::api::models::{
    Coin, CoinDetail, DerivativesEntry, MarketOverview, Movers, PricePoint, Sentiment, SignalEntry,
    SocialBuzz, VolumeAnomaly, WhaleTx,
};
use crate::api::{Feed, FeedPayload};
use crate::error::{DashboardError, Result};

pub type SharedState = Arc<Mutex<DashboardState>>;

/// Locks the shared state, recovering from a poisoned lock.
pub fn lock(state: &SharedState) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Rank,
    Name,
    Symbol,
    Price,
    Change1h,
    Change24h,
    Change7d,
    Volume,
    MarketCap,
}

impl SortColumn {
    pub const ALL: [SortColumn; 9] = [
        SortColumn::Rank,
        SortColumn::Name,
        SortColumn::Symbol,
        SortColumn::Price,
        SortColumn::Change1h,
        SortColumn::Change24h,
        SortColumn::Change7d,
        SortColumn::Volume,
        SortColumn::MarketCap,
    ];

    /// The coin field this column sorts on.
    pub fn field(&self) -> &'static str {
        match self {
            SortColumn::Rank => "market_cap_rank",
            SortColumn::Name => "name",
            SortColumn::Symbol => "symbol",
            SortColumn::Price => "current_price",
            SortColumn::Change1h => "price_change_percentage_1h_in_currency",
            SortColumn::Change24h => "price_change_percentage_24h_in_currency",
            SortColumn::Change7d => "price_change_percentage_7d_in_currency",
            SortColumn::Volume => "total_volume",
            SortColumn::MarketCap => "market_cap",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Rank => "#",
            SortColumn::Name => "Name",
            SortColumn::Symbol => "Symbol",
            SortColumn::Price => "Price",
            SortColumn::Change1h => "1h",
            SortColumn::Change24h => "24h",
            SortColumn::Change7d => "7d",
            SortColumn::Volume => "Volume",
            SortColumn::MarketCap => "Market Cap",
        }
    }

    fn key(&self, coin: &Coin) -> SortKey {
        let num = |v: Option<f64>| SortKey::Num(v.unwrap_or(0.0));
        match self {
            SortColumn::Rank => num(coin.market_cap_rank.map(f64::from)),
            SortColumn::Name => SortKey::Text(coin.name.clone()),
            SortColumn::Symbol => SortKey::Text(coin.symbol.clone()),
            SortColumn::Price => num(coin.current_price),
            SortColumn::Change1h => num(coin.price_change_percentage_1h_in_currency),
            SortColumn::Change24h => num(coin.price_change_percentage_24h_in_currency),
            SortColumn::Change7d => num(coin.price_change_percentage_7d_in_currency),
            SortColumn::Volume => num(coin.total_volume),
            SortColumn::MarketCap => num(coin.market_cap),
        }
    }
}

impl FromStr for SortColumn {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        SortColumn::ALL
            .iter()
            .copied()
            .find(|c| c.field() == s)
            .ok_or_else(|| DashboardError::InvalidInput(format!("unknown sort column '{}'", s)))
    }
}

/// Plain order comparison: numbers numerically, strings lexically.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Num(f64),
    Text(String),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Num(a), SortKey::Num(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Num(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Num(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Tr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub sort_column: SortColumn,
    pub sort_ascending: bool,
    pub search_query: String,
    pub selected_coin_id: Option<String>,
    pub show_watchlist_only: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            sort_column: SortColumn::Rank,
            sort_ascending: true,
            search_query: String::new(),
            selected_coin_id: None,
            show_watchlist_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
    /// `None` until the user has answered the storage consent banner.
    pub consent: Option<bool>,
    pub notification_permission: Permission,
}

#[derive(Debug, Clone, Default)]
pub struct Feeds {
    pub overview: Option<MarketOverview>,
    pub coins: Vec<Coin>,
    pub signals: Vec<SignalEntry>,
    pub movers: Movers,
    pub anomalies: Vec<VolumeAnomaly>,
    pub derivatives: Vec<DerivativesEntry>,
    pub whales: Vec<WhaleTx>,
    pub sentiment: Option<Sentiment>,
    pub social: Vec<SocialBuzz>,
}

/// OHLC series of the selected coin with its overlays.
#[derive(Debug, Clone)]
pub struct ChartState {
    pub coin_id: String,
    pub points: Vec<PricePoint>,
    pub overlays: IndicatorSeries,
    pub signal: Option<SignalEntry>,
    pub detail: Option<CoinDetail>,
    pub loaded_at: DateTime<Local>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DreamInputs {
    pub amount: f64,
    pub mode: InputMode,
    pub target_pct: f64,
}

impl Default for DreamInputs {
    fn default() -> Self {
        Self {
            amount: 1_000.0,
            mode: InputMode::Usd,
            target_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DreamOutcome {
    pub coin_id: String,
    pub current_price: f64,
    pub result: DreamResult,
    pub items: Vec<Affordability>,
}

/// Explicit user actions. The UI translates key presses into these.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SortBy(SortColumn),
    Search(String),
    SelectCoin(String),
    ToggleWatchlist(String),
    ToggleWatchlistOnly,
    AddAlert {
        coin_id: String,
        target: String,
        direction: Direction,
    },
    RemoveAlert(u64),
    ToggleTheme,
    ToggleLanguage,
    SetConsent(bool),
    ToggleNotifications,
    SetDreamAmount(String),
    SetDreamTarget(String),
    ToggleDreamMode,
    DreamTargetAth,
}

fn parse_positive(raw: &str, what: &str) -> Result<f64> {
    let cleaned = raw
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .replace(',', "");
    match cleaned.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(DashboardError::InvalidInput(format!(
            "{} must be a positive number, got '{}'",
            what,
            raw.trim()
        ))),
    }
}

pub struct DashboardState {
    feeds: Feeds,
    fetched_at: HashMap<Feed, DateTime<Local>>,
    last_refreshed: Option<DateTime<Local>>,
    view: ViewState,
    watchlist: BTreeSet<String>,
    prefs: Preferences,
    alerts: AlertEngine,
    chart: Option<ChartState>,
    dream: DreamInputs,
    reference_items: Vec<ReferenceItem>,
    indicator_config: IndicatorConfig,
    storage: Box<dyn Storage>,
}

impl DashboardState {
    /// Builds the state, restoring everything persisted in `storage`.
    pub fn new(
        storage: Box<dyn Storage>,
        retention: AlertRetention,
        indicator_config: IndicatorConfig,
    ) -> Self {
        let watchlist: BTreeSet<String> = storage::load_or_default::<Vec<String>>(&*storage, KEY_WATCHLIST)
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .collect();
        let saved_alerts: Vec<PriceAlert> = storage::load_or_default(&*storage, KEY_ALERTS);
        let prefs = Preferences {
            theme: storage::load_or_default(&*storage, KEY_THEME),
            language: storage::load_or_default(&*storage, KEY_LANGUAGE),
            consent: storage::load_or_default(&*storage, KEY_CONSENT),
            notification_permission: storage::load_or_default(&*storage, KEY_NOTIFICATION_PERMISSION),
        };

        info!(
            "Restored {} watchlist entries and {} alerts",
            watchlist.len(),
            saved_alerts.len()
        );

        Self {
            feeds: Feeds::default(),
            fetched_at: HashMap::new(),
            last_refreshed: None,
            view: ViewState::default(),
            watchlist,
            prefs,
            alerts: AlertEngine::with_alerts(saved_alerts, retention),
            chart: None,
            dream: DreamInputs::default(),
            reference_items: simulator::default_reference_items(),
            indicator_config,
            storage,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn feeds(&self) -> &Feeds {
        &self.feeds
    }

    pub fn coins(&self) -> &[Coin] {
        &self.feeds.coins
    }

    pub fn fetched_at(&self, feed: Feed) -> Option<DateTime<Local>> {
        self.fetched_at.get(&feed).copied()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.last_refreshed
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn alerts(&self) -> &[PriceAlert] {
        self.alerts.alerts()
    }

    pub fn chart(&self) -> Option<&ChartState> {
        self.chart.as_ref()
    }

    pub fn dream_inputs(&self) -> &DreamInputs {
        &self.dream
    }

    pub fn indicator_config(&self) -> &IndicatorConfig {
        &self.indicator_config
    }

    pub fn watchlist(&self) -> &BTreeSet<String> {
        &self.watchlist
    }

    pub fn is_watched(&self, coin_id: &str) -> bool {
        self.watchlist.contains(coin_id)
    }

    pub fn storage(&self) -> &dyn Storage {
        &*self.storage
    }

    // ─── Feeds ───

    /// Replaces one feed's snapshot wholesale.
    pub fn set_feed(&mut self, payload: FeedPayload) {
        let feed = payload.feed();
        match payload {
            FeedPayload::Overview(v) => self.feeds.overview = Some(v),
            FeedPayload::Coins(v) => self.feeds.coins = v,
            FeedPayload::Signals(v) => self.feeds.signals = v,
            FeedPayload::Movers(v) => self.feeds.movers = v,
            FeedPayload::Anomalies(v) => self.feeds.anomalies = v,
            FeedPayload::Derivatives(v) => self.feeds.derivatives = v,
            FeedPayload::Whales(v) => self.feeds.whales = v,
            FeedPayload::Sentiment(v) => self.feeds.sentiment = Some(v),
            FeedPayload::Social(v) => self.feeds.social = v,
        }
        self.fetched_at.insert(feed, Local::now());
        debug!("Feed {} updated", feed.as_str());
    }

    pub fn mark_refreshed(&mut self, at: DateTime<Local>) {
        self.last_refreshed = Some(at);
    }

    /// Current price of every coin in the latest snapshot.
    pub fn price_snapshot(&self) -> HashMap<String, f64> {
        self.feeds
            .coins
            .iter()
            .filter_map(|c| c.current_price.map(|p| (c.id.clone(), p)))
            .collect()
    }

    pub fn coin(&self, coin_id: &str) -> Option<&Coin> {
        self.feeds.coins.iter().find(|c| c.id == coin_id)
    }

    pub fn selected_coin(&self) -> Option<&Coin> {
        self.view
            .selected_coin_id
            .as_deref()
            .and_then(|id| self.coin(id))
    }

    // ─── View derivation ───

    /// Filtered and sorted coin table.
    pub fn view(&self) -> Vec<&Coin> {
        self.view_of(&self.feeds.coins)
    }

    /// Applies the watchlist filter, the search filter and the current sort
    /// to `coins`. Equal keys keep their input order.
    pub fn view_of<'a>(&self, coins: &'a [Coin]) -> Vec<&'a Coin> {
        let query = self.view.search_query.to_lowercase();

        let mut rows: Vec<&Coin> = coins
            .iter()
            .filter(|c| !self.view.show_watchlist_only || self.watchlist.contains(&c.id))
            .filter(|c| {
                query.is_empty()
                    || c.name.to_lowercase().contains(&query)
                    || c.symbol.to_lowercase().contains(&query)
            })
            .collect();

        let column = self.view.sort_column;
        let ascending = self.view.sort_ascending;
        rows.sort_by(|a, b| {
            let ordering = column.key(a).compare(&column.key(b));
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        rows
    }

    /// Same column toggles direction; a new column starts ascending.
    pub fn sort_by(&mut self, column: SortColumn) {
        if self.view.sort_column == column {
            self.view.sort_ascending = !self.view.sort_ascending;
        } else {
            self.view.sort_column = column;
            self.view.sort_ascending = true;
        }
    }

    pub fn set_search(&mut self, query: &str) {
        self.view.search_query = query.to_string();
    }

    /// Unknown ids are accepted; they simply match no row.
    pub fn select_coin(&mut self, coin_id: &str) {
        self.view.selected_coin_id = Some(coin_id.to_string());
    }

    /// Returns whether the coin is on the watchlist afterwards.
    pub fn toggle_watchlist(&mut self, coin_id: &str) -> bool {
        let watched = if self.watchlist.remove(coin_id) {
            false
        } else {
            self.watchlist.insert(coin_id.to_string());
            true
        };
        let ids: Vec<&String> = self.watchlist.iter().collect();
        storage::save(&mut *self.storage, KEY_WATCHLIST, &ids);
        watched
    }

    pub fn toggle_watchlist_only(&mut self) {
        self.view.show_watchlist_only = !self.view.show_watchlist_only;
    }

    // ─── Alerts ───

    pub fn add_alert(&mut self, coin_id: &str, target: &str, direction: Direction) -> Result<u64> {
        let target_price = alerts::parse_target(target)?;
        let id = self.alerts.add(coin_id, target_price, direction)?;
        self.persist_alerts();
        Ok(id)
    }

    pub fn remove_alert(&mut self, id: u64) -> bool {
        let removed = self.alerts.remove(id);
        if removed {
            self.persist_alerts();
        }
        removed
    }

    /// Runs the alert evaluator against the current coin prices.
    pub fn evaluate_alerts(&mut self) -> Vec<FiredAlert> {
        let prices = self.price_snapshot();
        let fired = self.alerts.evaluate(&prices);
        if !fired.is_empty() {
            self.persist_alerts();
        }
        fired
    }

    fn persist_alerts(&mut self) {
        let snapshot = self.alerts.alerts().to_vec();
        storage::save(&mut *self.storage, KEY_ALERTS, &snapshot);
    }

    // ─── Chart ───

    /// Stores a freshly loaded OHLC series and recomputes every overlay.
    pub fn set_ohlc(&mut self, coin_id: &str, points: Vec<PricePoint>) -> Result<()> {
        let overlays = IndicatorSeries::from_bars(&points, &self.indicator_config)?;
        let (signal, detail) = match self.chart.take() {
            Some(prev) if prev.coin_id == coin_id => (prev.signal, prev.detail),
            _ => (None, None),
        };
        self.chart = Some(ChartState {
            coin_id: coin_id.to_string(),
            points,
            overlays,
            signal,
            detail,
            loaded_at: Local::now(),
        });
        Ok(())
    }

    /// Attaches the per-coin signal and detail to the chart of `coin_id`.
    pub fn set_chart_extras(
        &mut self,
        coin_id: &str,
        signal: Option<SignalEntry>,
        detail: Option<CoinDetail>,
    ) {
        if let Some(chart) = self.chart.as_mut().filter(|c| c.coin_id == coin_id) {
            if signal.is_some() {
                chart.signal = signal;
            }
            if detail.is_some() {
                chart.detail = detail;
            }
        }
    }

    // ─── Preferences ───

    pub fn toggle_theme(&mut self) {
        self.prefs.theme = match self.prefs.theme {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
        storage::save(&mut *self.storage, KEY_THEME, &self.prefs.theme);
    }

    pub fn toggle_language(&mut self) {
        self.prefs.language = match self.prefs.language {
            Language::En => Language::Tr,
            Language::Tr => Language::En,
        };
        storage::save(&mut *self.storage, KEY_LANGUAGE, &self.prefs.language);
    }

    pub fn set_consent(&mut self, accepted: bool) {
        self.prefs.consent = Some(accepted);
        storage::save(&mut *self.storage, KEY_CONSENT, &self.prefs.consent);
    }

    pub fn set_notification_permission(&mut self, permission: Permission) {
        self.prefs.notification_permission = permission;
        storage::save(&mut *self.storage, KEY_NOTIFICATION_PERMISSION, &permission);
    }

    // ─── Dream machine ───

    pub fn set_dream_amount(&mut self, raw: &str) -> Result<()> {
        self.dream.amount = parse_positive(raw, "amount")?;
        Ok(())
    }

    pub fn set_dream_target(&mut self, raw: &str) -> Result<()> {
        self.dream.target_pct = parse_positive(raw, "target")?;
        Ok(())
    }

    pub fn toggle_dream_mode(&mut self) {
        self.dream.mode = self.dream.mode.toggled();
    }

    /// Sets the target move to reach the selected coin's all-time high.
    /// Returns `false`, leaving the target untouched, when there is no ATH
    /// above the current price.
    pub fn apply_ath_target(&mut self) -> bool {
        let coin = match self.selected_coin() {
            Some(c) => c,
            None => return false,
        };
        let ath = coin.ath.or_else(|| {
            self.chart
                .as_ref()
                .filter(|ch| ch.coin_id == coin.id)
                .and_then(|ch| ch.detail.as_ref())
                .and_then(|d| d.ath)
        });

        match (coin.current_price, ath) {
            (Some(price), Some(ath)) => match simulator::ath_target_pct(price, ath) {
                Some(pct) => {
                    self.dream.target_pct = pct;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Result for the selected coin, or `None` when nothing valid is selected.
    pub fn dream_outcome(&self) -> Option<DreamOutcome> {
        let coin = self.selected_coin()?;
        let current_price = coin.current_price?;
        let result = simulator::simulate(
            current_price,
            self.dream.amount,
            self.dream.mode,
            self.dream.target_pct,
        )?;
        Some(DreamOutcome {
            coin_id: coin.id.clone(),
            current_price,
            items: simulator::affordability(result.profit, &self.reference_items),
            result,
        })
    }

    // ─── Commands ───

    /// Applies one user command. Invalid input is rejected before any
    /// state changes.
    pub fn handle(&mut self, command: Command) -> Result<()> {
        debug!("Command: {:?}", command);
        match command {
            Command::SortBy(column) => self.sort_by(column),
            Command::Search(query) => self.set_search(&query),
            Command::SelectCoin(id) => self.select_coin(&id),
            Command::ToggleWatchlist(id) => {
                self.toggle_watchlist(&id);
            }
            Command::ToggleWatchlistOnly => self.toggle_watchlist_only(),
            Command::AddAlert {
                coin_id,
                target,
                direction,
            } => {
                self.add_alert(&coin_id, &target, direction)?;
            }
            Command::RemoveAlert(id) => {
                if !self.remove_alert(id) {
                    return Err(DashboardError::InvalidInput(format!("no alert with id {}", id)));
                }
            }
            Command::ToggleTheme => self.toggle_theme(),
            Command::ToggleLanguage => self.toggle_language(),
            Command::SetConsent(accepted) => self.set_consent(accepted),
            Command::ToggleNotifications => {
                let next = match self.prefs.notification_permission {
                    Permission::Granted => Permission::Denied,
                    Permission::Default | Permission::Denied => Permission::Granted,
                };
                self.set_notification_permission(next);
            }
            Command::SetDreamAmount(raw) => self.set_dream_amount(&raw)?,
            Command::SetDreamTarget(raw) => self.set_dream_target(&raw)?,
            Command::ToggleDreamMode => self.toggle_dream_mode(),
            Command::DreamTargetAth => {
                self.apply_ath_target();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::core::storage::MemoryStorage;

    fn coin(id: &str, name: &str, symbol: &str, price: Option<f64>, rank: Option<u32>) -> Coin {
        Coin {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image: None,
            current_price: price,
            market_cap: None,
            market_cap_rank: rank,
            total_volume: None,
            price_change_percentage_1h_in_currency: None,
            price_change_percentage_24h_in_currency: None,
            price_change_percentage_7d_in_currency: None,
            price_change_percentage_24h: None,
            high_24h: None,
            low_24h: None,
            ath: None,
            sparkline_in_7d: None,
        }
    }

    fn state() -> DashboardState {
        DashboardState::new(
            Box::new(MemoryStorage::new()),
            AlertRetention::RetainAndFlag,
            IndicatorConfig::default(),
        )
    }

    fn ids(rows: &[&Coin]) -> Vec<String> {
        rows.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn search_matches_name_or_symbol_case_insensitively() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("a", "Alpha", "alp", Some(1.0), Some(1)),
            coin("b", "Beta", "bet", Some(2.0), Some(2)),
        ]));
        s.set_search("al");
        assert_eq!(ids(&s.view()), vec!["a"]);

        s.set_search("BET");
        assert_eq!(ids(&s.view()), vec!["b"]);
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("bitcoin", "Bitcoin", "btc", Some(1.0), Some(1)),
            coin("bitcoin-cash", "Bitcoin Cash", "bch", Some(2.0), Some(2)),
        ]));
        s.set_search("bitcoin ");
        assert_eq!(ids(&s.view()), vec!["bitcoin-cash"]);
    }

    #[test]
    fn sort_by_price_toggles_direction() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("five", "Five", "f", Some(5.0), None),
            coin("one", "One", "o", Some(1.0), None),
            coin("three", "Three", "t", Some(3.0), None),
        ]));

        s.sort_by(SortColumn::Price);
        assert!(s.view_state().sort_ascending);
        let prices: Vec<f64> = s.view().iter().map(|c| c.current_price.unwrap()).collect();
        assert_eq!(prices, vec![1.0, 3.0, 5.0]);

        s.sort_by(SortColumn::Price);
        let prices: Vec<f64> = s.view().iter().map(|c| c.current_price.unwrap()).collect();
        assert_eq!(prices, vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn new_column_resets_to_ascending() {
        let mut s = state();
        assert_eq!(s.view_state().sort_column, SortColumn::Rank);
        s.sort_by(SortColumn::Rank);
        assert!(!s.view_state().sort_ascending);
        s.sort_by(SortColumn::Volume);
        assert_eq!(s.view_state().sort_column, SortColumn::Volume);
        assert!(s.view_state().sort_ascending);
    }

    #[test]
    fn missing_values_sort_as_zero_and_ties_keep_input_order() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("x", "X", "x", Some(2.0), None),
            coin("none1", "N1", "n", None, None),
            coin("zero", "Z", "z", Some(0.0), None),
            coin("none2", "N2", "m", None, None),
        ]));
        s.sort_by(SortColumn::Price);
        assert_eq!(ids(&s.view()), vec!["none1", "zero", "none2", "x"]);

        s.sort_by(SortColumn::Price);
        assert_eq!(ids(&s.view()), vec!["x", "none1", "zero", "none2"]);
    }

    #[test]
    fn text_columns_sort_lexically() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("b", "beta", "b", None, None),
            coin("a", "Alpha", "a", None, None),
            coin("c", "alpha", "c", None, None),
        ]));
        s.sort_by(SortColumn::Name);
        assert_eq!(ids(&s.view()), vec!["a", "c", "b"]);
    }

    #[test]
    fn watchlist_filter_applies_before_search() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![
            coin("bitcoin", "Bitcoin", "btc", Some(1.0), Some(1)),
            coin("bitcoin-cash", "Bitcoin Cash", "bch", Some(1.0), Some(2)),
            coin("ethereum", "Ethereum", "eth", Some(1.0), Some(3)),
        ]));
        assert!(s.toggle_watchlist("bitcoin-cash"));
        assert!(s.toggle_watchlist("ethereum"));
        s.toggle_watchlist_only();
        assert_eq!(ids(&s.view()), vec!["bitcoin-cash", "ethereum"]);

        s.set_search("bit");
        assert_eq!(ids(&s.view()), vec!["bitcoin-cash"]);

        assert!(!s.toggle_watchlist("ethereum"));
        assert!(!s.is_watched("ethereum"));
    }

    #[test]
    fn watchlist_is_persisted_on_every_toggle() {
        let mut s = state();
        s.toggle_watchlist("solana");
        let stored: Vec<String> = storage::load_or_default(s.storage(), KEY_WATCHLIST);
        assert_eq!(stored, vec!["solana".to_string()]);

        s.toggle_watchlist("solana");
        let stored: Vec<String> = storage::load_or_default(s.storage(), KEY_WATCHLIST);
        assert!(stored.is_empty());
    }

    #[test]
    fn persisted_state_is_restored() {
        let mut storage = MemoryStorage::new();
        storage.set(KEY_WATCHLIST, serde_json::json!(["bitcoin", ""])).unwrap();
        storage.set(KEY_THEME, serde_json::json!("light")).unwrap();
        storage.set(KEY_LANGUAGE, serde_json::json!(42)).unwrap();
        storage
            .set(
                KEY_ALERTS,
                serde_json::json!([{"id": 3, "coinId": "bitcoin", "targetPrice": 10.0, "direction": "below"}]),
            )
            .unwrap();

        let s = DashboardState::new(
            Box::new(storage),
            AlertRetention::RetainAndFlag,
            IndicatorConfig::default(),
        );
        assert!(s.is_watched("bitcoin"));
        assert_eq!(s.watchlist().len(), 1);
        assert_eq!(s.prefs().theme, Theme::Light);
        assert_eq!(s.prefs().language, Language::En);
        assert_eq!(s.alerts().len(), 1);
        assert!(!s.alerts()[0].triggered);
    }

    #[test]
    fn select_coin_accepts_unknown_ids() {
        let mut s = state();
        s.select_coin("does-not-exist");
        assert_eq!(s.view_state().selected_coin_id.as_deref(), Some("does-not-exist"));
        assert!(s.selected_coin().is_none());
        assert!(s.dream_outcome().is_none());
    }

    #[test]
    fn set_feed_replaces_and_timestamps() {
        let mut s = state();
        assert!(s.fetched_at(Feed::Coins).is_none());
        s.set_feed(FeedPayload::Coins(vec![coin("a", "A", "a", Some(1.0), None)]));
        s.set_feed(FeedPayload::Coins(vec![coin("b", "B", "b", Some(2.0), None)]));
        assert_eq!(s.coins().len(), 1);
        assert_eq!(s.coins()[0].id, "b");
        assert!(s.fetched_at(Feed::Coins).is_some());
        assert!(s.fetched_at(Feed::Signals).is_none());
    }

    #[test]
    fn alerts_fire_against_the_coin_snapshot() {
        let mut s = state();
        s.add_alert("bitcoin", "100", Direction::Above).unwrap();
        s.set_feed(FeedPayload::Coins(vec![coin("bitcoin", "Bitcoin", "btc", Some(99.0), None)]));
        assert!(s.evaluate_alerts().is_empty());

        s.set_feed(FeedPayload::Coins(vec![coin("bitcoin", "Bitcoin", "btc", Some(101.0), None)]));
        assert_eq!(s.evaluate_alerts().len(), 1);
        assert!(s.evaluate_alerts().is_empty());

        let stored: Vec<PriceAlert> = storage::load_or_default(s.storage(), KEY_ALERTS);
        assert!(stored[0].triggered);
    }

    #[test]
    fn invalid_alert_input_changes_nothing() {
        let mut s = state();
        let err = s.handle(Command::AddAlert {
            coin_id: "bitcoin".into(),
            target: "lots".into(),
            direction: Direction::Above,
        });
        assert!(matches!(err, Err(DashboardError::InvalidInput(_))));
        assert!(s.alerts().is_empty());
        assert!(s.storage().get(KEY_ALERTS).is_none());
    }

    #[test]
    fn dream_outcome_uses_selected_coin_price() {
        let mut s = state();
        s.set_feed(FeedPayload::Coins(vec![coin("btc", "Bitcoin", "btc", Some(100.0), Some(1))]));
        s.handle(Command::SelectCoin("btc".into())).unwrap();
        s.handle(Command::SetDreamAmount("1000".into())).unwrap();
        s.handle(Command::SetDreamTarget("50%".into())).unwrap();

        let outcome = s.dream_outcome().unwrap();
        assert_eq!(outcome.result.coins_bought, 10.0);
        assert_eq!(outcome.result.profit, 500.0);
        assert_eq!(outcome.items.len(), simulator::default_reference_items().len());

        assert!(s.handle(Command::SetDreamAmount("-3".into())).is_err());
        assert_eq!(s.dream_inputs().amount, 1000.0);
    }

    #[test]
    fn ath_shortcut_is_noop_at_or_above_ath() {
        let mut s = state();
        let mut btc = coin("btc", "Bitcoin", "btc", Some(100.0), Some(1));
        btc.ath = Some(150.0);
        let mut eth = coin("eth", "Ethereum", "eth", Some(100.0), Some(2));
        eth.ath = Some(90.0);
        s.set_feed(FeedPayload::Coins(vec![btc, eth]));

        s.select_coin("btc");
        assert!(s.apply_ath_target());
        assert!((s.dream_inputs().target_pct - 50.0).abs() < 1e-9);

        s.select_coin("eth");
        assert!(!s.apply_ath_target());
        assert!((s.dream_inputs().target_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn ohlc_recomputes_overlays_and_rejects_empty_series() {
        let mut s = state();
        let points: Vec<PricePoint> = (0..30)
            .map(|i| PricePoint {
                time: i,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0 + i as f64,
                volume: None,
            })
            .collect();
        s.set_ohlc("btc", points).unwrap();
        let chart = s.chart().unwrap();
        assert_eq!(chart.overlays.len(), 30);
        assert_eq!(chart.overlays.ema_short[7], None);
        assert!(chart.overlays.ema_short[8].is_some());

        assert!(matches!(
            s.set_ohlc("btc", Vec::new()),
            Err(DashboardError::InvalidParameter(_))
        ));
        assert_eq!(s.chart().unwrap().points.len(), 30);
    }

    #[test]
    fn preferences_toggle_and_persist() {
        let mut s = state();
        s.handle(Command::ToggleTheme).unwrap();
        s.handle(Command::ToggleLanguage).unwrap();
        s.handle(Command::SetConsent(true)).unwrap();
        s.handle(Command::ToggleNotifications).unwrap();

        assert_eq!(s.prefs().theme, Theme::Light);
        assert_eq!(s.prefs().language, Language::Tr);
        assert_eq!(
            s.storage().get(KEY_THEME),
            Some(serde_json::json!("light"))
        );
        assert_eq!(s.storage().get(KEY_CONSENT), Some(serde_json::json!(true)));
        assert_eq!(
            s.storage().get(KEY_NOTIFICATION_PERMISSION),
            Some(serde_json::json!("granted"))
        );
    }

    #[test]
    fn sort_column_from_field_name() {
        assert_eq!(
            "current_price".parse::<SortColumn>().unwrap(),
            SortColumn::Price
        );
        assert!("nope".parse::<SortColumn>().is_err());
    }
}
