pub mod client;
pub mod models;

use models::{
    Coin, DerivativesEntry, MarketOverview, Movers, Sentiment, SignalEntry, SocialBuzz,
    VolumeAnomaly, WhaleTx,
};

/// The feeds polled on every refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feed {
    Overview,
    Coins,
    Signals,
    Movers,
    Anomalies,
    Derivatives,
    Whales,
    Sentiment,
    Social,
}

impl Feed {
    pub const ALL: [Feed; 9] = [
        Feed::Overview,
        Feed::Coins,
        Feed::Signals,
        Feed::Movers,
        Feed::Anomalies,
        Feed::Derivatives,
        Feed::Whales,
        Feed::Sentiment,
        Feed::Social,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Feed::Overview => "/market/overview",
            Feed::Coins => "/market/coins",
            Feed::Signals => "/signals",
            Feed::Movers => "/market/movers",
            Feed::Anomalies => "/volume/anomalies",
            Feed::Derivatives => "/derivatives/overview",
            Feed::Whales => "/whales/recent",
            Feed::Sentiment => "/sentiment",
            Feed::Social => "/social/buzz",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Overview => "overview",
            Feed::Coins => "coins",
            Feed::Signals => "signals",
            Feed::Movers => "movers",
            Feed::Anomalies => "anomalies",
            Feed::Derivatives => "derivatives",
            Feed::Whales => "whales",
            Feed::Sentiment => "sentiment",
            Feed::Social => "social",
        }
    }
}

/// A freshly fetched feed snapshot, tagged with the feed it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPayload {
    Overview(MarketOverview),
    Coins(Vec<Coin>),
    Signals(Vec<SignalEntry>),
    Movers(Movers),
    Anomalies(Vec<VolumeAnomaly>),
    Derivatives(Vec<DerivativesEntry>),
    Whales(Vec<WhaleTx>),
    Sentiment(Sentiment),
    Social(Vec<SocialBuzz>),
}

impl FeedPayload {
    pub fn feed(&self) -> Feed {
        match self {
            FeedPayload::Overview(_) => Feed::Overview,
            FeedPayload::Coins(_) => Feed::Coins,
            FeedPayload::Signals(_) => Feed::Signals,
            FeedPayload::Movers(_) => Feed::Movers,
            FeedPayload::Anomalies(_) => Feed::Anomalies,
            FeedPayload::Derivatives(_) => Feed::Derivatives,
            FeedPayload::Whales(_) => Feed::Whales,
            FeedPayload::Sentiment(_) => Feed::Sentiment,
            FeedPayload::Social(_) => Feed::Social,
        }
    }
}
