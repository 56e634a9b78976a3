//! Typed payloads for the market REST API.
//!
//! Every optional field the backend may omit is an `Option` or carries a
//! serde default, so render code never has to null-check raw JSON. List
//! payloads go through [`parse_list`], which drops malformed entries one by
//! one but rejects a body that is not a list.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{self, DashboardError};
use crate::ui::core::indicators::Timestamped;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub ath: Option<f64>,
    #[serde(default, alias = "sparkline_7d")]
    pub sparkline_in_7d: Option<Sparkline>,
}

impl Coin {
    /// 24h change, preferring the in-currency figure like the web table does.
    pub fn change_24h(&self) -> Option<f64> {
        self.price_change_percentage_24h_in_currency
            .or(self.price_change_percentage_24h)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// One OHLC bar. `time` is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl ta::Open for PricePoint {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for PricePoint {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for PricePoint {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for PricePoint {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for PricePoint {
    fn volume(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }
}

impl Timestamped for PricePoint {
    fn timestamp(&self) -> i64 {
        self.time
    }
}

/// Sorts bars by time and collapses duplicate timestamps, keeping the bar
/// received last.
pub fn normalize_series(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.time);
    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.time == point.time => *last = point,
            _ => out.push(point),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalKind {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
    #[default]
    NoData,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::StrongBuy => "STRONG BUY",
            SignalKind::Buy => "BUY",
            SignalKind::Neutral => "NEUTRAL",
            SignalKind::Sell => "SELL",
            SignalKind::StrongSell => "STRONG SELL",
            SignalKind::NoData => "NO DATA",
        }
    }
}

impl From<String> for SignalKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_uppercase().replace('_', " ").as_str() {
            "STRONG BUY" => SignalKind::StrongBuy,
            "BUY" => SignalKind::Buy,
            "NEUTRAL" => SignalKind::Neutral,
            "SELL" => SignalKind::Sell,
            "STRONG SELL" => SignalKind::StrongSell,
            _ => SignalKind::NoData,
        }
    }
}

impl From<SignalKind> for String {
    fn from(kind: SignalKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl From<String> for Confidence {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl From<Confidence> for String {
    fn from(c: Confidence) -> Self {
        match c {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalLayers {
    #[serde(default)]
    pub technical: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub sentiment: Option<f64>,
    #[serde(default)]
    pub derivatives: Option<f64>,
}

/// A `{value, signal}` reading as the backend emits for RSI, funding rate
/// and long/short ratio.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub signal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalIndicators {
    #[serde(default)]
    pub rsi: Option<Reading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub coin_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signal: SignalKind,
    #[serde(default)]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: Confidence,
    #[serde(default, deserialize_with = "null_as_default")]
    pub layers: SignalLayers,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indicators: SignalIndicators,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_or_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FearGreedPoint {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub classification: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FearGreed {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub history: Vec<FearGreedPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketScore {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketOverview {
    #[serde(default)]
    pub total_market_cap_usd: Option<f64>,
    #[serde(default)]
    pub total_volume_usd: Option<f64>,
    #[serde(default)]
    pub btc_dominance: Option<f64>,
    #[serde(default)]
    pub market_cap_change_24h: Option<f64>,
    #[serde(default)]
    pub active_cryptocurrencies: Option<u64>,
    #[serde(default)]
    pub fear_greed: Option<FearGreed>,
    #[serde(default)]
    pub market_score: Option<MarketScore>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Movers {
    #[serde(default)]
    pub gainers: Vec<Coin>,
    #[serde(default)]
    pub losers: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnomaly {
    #[serde(default)]
    pub coin_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub current_volume: Option<f64>,
    #[serde(default)]
    pub baseline_volume: Option<f64>,
    #[serde(default)]
    pub deviation_multiple: Option<f64>,
    #[serde(default)]
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativesEntry {
    #[serde(default)]
    pub coin_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub funding_rate: Option<Reading>,
    #[serde(default)]
    pub long_short_ratio: Option<Reading>,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleTx {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub value_btc: Option<f64>,
    #[serde(default)]
    pub value_usd: Option<f64>,
    /// Unix seconds; the placeholder row carries an empty string instead.
    #[serde(default, deserialize_with = "number_or_none")]
    pub time: Option<i64>,
    /// Set by the backend when the upstream tracker is unavailable.
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentSummary {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub positive: u32,
    #[serde(default)]
    pub negative: u32,
    #[serde(default)]
    pub neutral: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default)]
    pub overall: Option<SentimentSummary>,
    #[serde(default)]
    pub recent_news: Vec<NewsArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialBuzz {
    #[serde(default)]
    pub coin_id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub buzz_score: Option<f64>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub volume_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoinDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub ath: Option<f64>,
    #[serde(default)]
    pub ath_change_percentage: Option<f64>,
    #[serde(default)]
    pub atl: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parses a JSON array leniently: entries that fail to deserialize are
/// skipped. A body that is not an array at all is an error, so the caller
/// keeps its previous snapshot.
pub fn parse_list<T: DeserializeOwned>(value: Value, what: &str) -> error::Result<Vec<T>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DashboardError::Payload(format!(
                "expected a list of {} entries, got {}",
                what,
                type_name(&other)
            )));
        }
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("Skipping malformed {} entry: {}", what, e);
                None
            }
        })
        .collect();

    if parsed.len() < total {
        warn!(
            "Dropped {} of {} malformed {} entries",
            total - parsed.len(),
            total,
            what
        );
    }
    Ok(parsed)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coin_tolerates_missing_optional_fields() {
        let coin: Coin = serde_json::from_value(json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 64000.5,
            "market_cap_rank": 1
        }))
        .unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.market_cap_rank, Some(1));
        assert!(coin.total_volume.is_none());
        assert!(coin.sparkline_in_7d.is_none());
    }

    #[test]
    fn change_24h_falls_back_to_plain_field() {
        let coin: Coin = serde_json::from_value(json!({
            "id": "eth",
            "price_change_percentage_24h": -2.5
        }))
        .unwrap();
        assert_eq!(coin.change_24h(), Some(-2.5));
    }

    #[test]
    fn signal_kind_parses_backend_strings() {
        let entry: SignalEntry = serde_json::from_value(json!({
            "coin_id": "solana",
            "signal": "STRONG BUY",
            "score": 0.42,
            "confidence": "High",
            "layers": {"technical": 0.5, "volume": 0.1},
            "indicators": {"rsi": {"value": 28.4, "signal": "oversold"}}
        }))
        .unwrap();
        assert_eq!(entry.signal, SignalKind::StrongBuy);
        assert_eq!(entry.confidence, Confidence::High);
        assert_eq!(entry.layers.technical, Some(0.5));
        assert_eq!(entry.layers.sentiment, None);
        assert_eq!(entry.indicators.rsi.unwrap().value, Some(28.4));
    }

    #[test]
    fn unknown_signal_and_null_layers_default() {
        let entry: SignalEntry = serde_json::from_value(json!({
            "coin_id": "x",
            "signal": "MOON",
            "confidence": "???",
            "layers": null,
            "indicators": null
        }))
        .unwrap();
        assert_eq!(entry.signal, SignalKind::NoData);
        assert_eq!(entry.confidence, Confidence::Low);
        assert_eq!(entry.layers, SignalLayers::default());
        assert!(entry.indicators.rsi.is_none());
    }

    #[test]
    fn signal_kind_accepts_underscore_spelling() {
        assert_eq!(
            SignalKind::from("strong_sell".to_string()),
            SignalKind::StrongSell
        );
        assert_eq!(String::from(SignalKind::NoData), "NO DATA");
    }

    #[test]
    fn parse_list_skips_malformed_entries() {
        let coins: Vec<Coin> = parse_list(
            json!([
                {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
                {"symbol": "nope"},
                {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "current_price": "bad"},
                {"id": "solana", "symbol": "sol", "name": "Solana"}
            ]),
            "coin",
        )
        .unwrap();
        let ids: Vec<&str> = coins.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "solana"]);
    }

    #[test]
    fn whale_time_tolerates_placeholder_rows() {
        let txs: Vec<WhaleTx> = parse_list(
            json!([
                {"hash": "abc", "value_btc": 512.0, "time": 1700000000},
                {"hash": "", "time": "", "note": "Whale tracking unavailable"}
            ]),
            "whale",
        )
        .unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].time, Some(1_700_000_000));
        assert_eq!(txs[1].time, None);
    }

    #[test]
    fn parse_list_rejects_null_or_object_bodies() {
        assert!(matches!(
            parse_list::<Coin>(Value::Null, "coin"),
            Err(DashboardError::Payload(_))
        ));
        assert!(matches!(
            parse_list::<Coin>(json!({"error": "down"}), "coin"),
            Err(DashboardError::Payload(_))
        ));
        assert!(parse_list::<Coin>(json!([]), "coin").unwrap().is_empty());
    }

    #[test]
    fn normalize_series_sorts_and_keeps_last_duplicate() {
        let bar = |time, close| PricePoint {
            time,
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        };
        let series = normalize_series(vec![bar(30, 3.0), bar(10, 1.0), bar(20, 2.0), bar(20, 2.5)]);
        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
    }

    #[test]
    fn price_point_implements_ta_traits() {
        use ta::{Close, Volume};
        let p: PricePoint = serde_json::from_value(json!({
            "time": 1700000000, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5
        }))
        .unwrap();
        assert_eq!(p.close(), 1.5);
        assert_eq!(p.volume(), 0.0);
    }
}
