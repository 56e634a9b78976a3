use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::ui::core::alerts::AlertRetention;
use crate::ui::core::indicators::IndicatorConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the market API, without trailing slash.
    pub api_url: String,
    /// Auto refresh interval.
    pub refresh_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Chart overlay parameters.
    pub indicators: IndicatorConfig,
    /// JSON file holding preferences, watchlist and alerts.
    pub state_file: PathBuf,
    pub alert_retention: AlertRetention,
    /// Coin whose chart is loaded on start.
    pub default_coin: String,
    /// Where logs go. The terminal belongs to the UI, so stderr is only
    /// useful when redirected.
    pub log_file: Option<PathBuf>,
    pub log_level: log::LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            refresh_interval: Duration::from_secs(120),
            request_timeout: Duration::from_secs(15),
            indicators: IndicatorConfig::default(),
            state_file: PathBuf::from("coinboard-state.json"),
            alert_retention: AlertRetention::default(),
            default_coin: "bitcoin".to_string(),
            log_file: None,
            log_level: log::LevelFilter::Info,
        }
    }
}

/// Parses `key` if set, warning and keeping `default` when it does not parse.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
    }
}

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let defaults = Self::default();

        let api_url = non_empty(&lookup, "COINBOARD_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let refresh_secs: u64 = parse_or(
            &lookup,
            "COINBOARD_REFRESH_SECS",
            defaults.refresh_interval.as_secs(),
        );
        let refresh_interval = if refresh_secs == 0 {
            warn!("COINBOARD_REFRESH_SECS must be positive, using default");
            defaults.refresh_interval
        } else {
            Duration::from_secs(refresh_secs)
        };

        let timeout_secs: u64 = parse_or(
            &lookup,
            "COINBOARD_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        );

        let indicators = IndicatorConfig {
            ema_short: parse_or(&lookup, "COINBOARD_EMA_SHORT", defaults.indicators.ema_short),
            ema_long: parse_or(&lookup, "COINBOARD_EMA_LONG", defaults.indicators.ema_long),
            bb_period: parse_or(&lookup, "COINBOARD_BB_PERIOD", defaults.indicators.bb_period),
            bb_multiplier: parse_or(
                &lookup,
                "COINBOARD_BB_MULTIPLIER",
                defaults.indicators.bb_multiplier,
            ),
        };
        indicators
            .validate()
            .map_err(|e| DashboardError::Config(e.to_string()))?;

        let alert_retention = match non_empty(&lookup, "COINBOARD_ALERT_RETENTION") {
            Some(raw) => raw.parse()?,
            None => defaults.alert_retention,
        };

        Ok(Self {
            api_url,
            refresh_interval,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            indicators,
            state_file: non_empty(&lookup, "COINBOARD_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_file),
            alert_retention,
            default_coin: non_empty(&lookup, "COINBOARD_DEFAULT_COIN")
                .unwrap_or(defaults.default_coin),
            log_file: non_empty(&lookup, "COINBOARD_LOG_FILE").map(PathBuf::from),
            log_level: parse_or(&lookup, "COINBOARD_LOG_LEVEL", defaults.log_level),
        })
    }
}
