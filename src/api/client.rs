use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::models::{
    normalize_series, parse_list, Coin, CoinDetail, DerivativesEntry, MarketOverview, Movers,
    PricePoint, Sentiment, SignalEntry, SocialBuzz, VolumeAnomaly, WhaleTx,
};
use super::{Feed, FeedPayload};
use crate::error::{DashboardError, Result};

const USER_AGENT: &str = "coinboard/0.1 (terminal market dashboard)";

/// The market REST API as seen by the dashboard.
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn market_overview(&self) -> Result<MarketOverview>;
    async fn coins(&self) -> Result<Vec<Coin>>;
    async fn movers(&self) -> Result<Movers>;
    async fn signals(&self) -> Result<Vec<SignalEntry>>;
    async fn coin_signal(&self, coin_id: &str) -> Result<SignalEntry>;
    async fn ohlc(&self, coin_id: &str) -> Result<Vec<PricePoint>>;
    async fn volume_anomalies(&self) -> Result<Vec<VolumeAnomaly>>;
    async fn derivatives(&self) -> Result<Vec<DerivativesEntry>>;
    async fn whales(&self) -> Result<Vec<WhaleTx>>;
    async fn sentiment(&self) -> Result<Sentiment>;
    async fn social_buzz(&self) -> Result<Vec<SocialBuzz>>;
    async fn coin_detail(&self, coin_id: &str) -> Result<CoinDetail>;

    async fn fetch_feed(&self, feed: Feed) -> Result<FeedPayload> {
        Ok(match feed {
            Feed::Overview => FeedPayload::Overview(self.market_overview().await?),
            Feed::Coins => FeedPayload::Coins(self.coins().await?),
            Feed::Signals => FeedPayload::Signals(self.signals().await?),
            Feed::Movers => FeedPayload::Movers(self.movers().await?),
            Feed::Anomalies => FeedPayload::Anomalies(self.volume_anomalies().await?),
            Feed::Derivatives => FeedPayload::Derivatives(self.derivatives().await?),
            Feed::Whales => FeedPayload::Whales(self.whales().await?),
            Feed::Sentiment => FeedPayload::Sentiment(self.sentiment().await?),
            Feed::Social => FeedPayload::Social(self.social_buzz().await?),
        })
    }
}

/// reqwest-backed client for the dashboard backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get_json(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let value = self.get_json(path).await?;
        parse_list(value, what)
    }
}

fn coin_path(prefix: &str, coin_id: &str) -> Result<String> {
    let id = coin_id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(DashboardError::InvalidInput(format!(
            "invalid coin id '{}'",
            coin_id
        )));
    }
    Ok(format!("{}/{}", prefix, id))
}

#[async_trait]
impl MarketApi for ApiClient {
    async fn market_overview(&self) -> Result<MarketOverview> {
        self.get(Feed::Overview.path()).await
    }

    async fn coins(&self) -> Result<Vec<Coin>> {
        self.get_list(Feed::Coins.path(), "coin").await
    }

    async fn movers(&self) -> Result<Movers> {
        self.get(Feed::Movers.path()).await
    }

    async fn signals(&self) -> Result<Vec<SignalEntry>> {
        self.get_list(Feed::Signals.path(), "signal").await
    }

    async fn coin_signal(&self, coin_id: &str) -> Result<SignalEntry> {
        self.get(&coin_path("/signals", coin_id)?).await
    }

    async fn ohlc(&self, coin_id: &str) -> Result<Vec<PricePoint>> {
        let points = self.get_list(&coin_path("/ohlc", coin_id)?, "ohlc").await?;
        Ok(normalize_series(points))
    }

    async fn volume_anomalies(&self) -> Result<Vec<VolumeAnomaly>> {
        self.get_list(Feed::Anomalies.path(), "volume anomaly").await
    }

    async fn derivatives(&self) -> Result<Vec<DerivativesEntry>> {
        self.get_list(Feed::Derivatives.path(), "derivatives").await
    }

    async fn whales(&self) -> Result<Vec<WhaleTx>> {
        self.get_list(Feed::Whales.path(), "whale tx").await
    }

    async fn sentiment(&self) -> Result<Sentiment> {
        self.get(Feed::Sentiment.path()).await
    }

    async fn social_buzz(&self) -> Result<Vec<SocialBuzz>> {
        self.get_list(Feed::Social.path(), "social buzz").await
    }

    async fn coin_detail(&self, coin_id: &str) -> Result<CoinDetail> {
        self.get(&coin_path("/coin", coin_id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(5));
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.url(Feed::Coins.path()),
            "http://localhost:8000/api/market/coins"
        );
    }

    #[test]
    fn coin_path_rejects_path_injection() {
        assert_eq!(coin_path("/ohlc", " bitcoin ").unwrap(), "/ohlc/bitcoin");
        assert!(coin_path("/ohlc", "").is_err());
        assert!(coin_path("/ohlc", "../health").is_err());
        assert!(coin_path("/coin", "btc?x=1").is_err());
    }
}
