use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clanboard_shared::{MarketCalculator, ProfitableRow, UnderpricedRow};
use tokio::sync::RwLock;

use crate::client::PriceFeedClient;
use crate::config::{
    detail_max_concurrency, detail_top_n, market_poll_interval, underpriced_threshold,
};

/// Opportunities derived from one latest-prices response.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub record_count: usize,
    pub profitable: Vec<ProfitableRow>,
    pub underpriced: Vec<UnderpricedRow>,
}

#[derive(Clone)]
pub struct FeedState {
    pub client: PriceFeedClient,
    pub calculator: MarketCalculator,
    /// Most recent successful snapshot. Replaced wholesale, never merged.
    pub latest: Arc<RwLock<Option<MarketSnapshot>>>,
    pub poll_interval: Duration,
    pub detail_top_n: usize,
    pub detail_max_concurrency: usize,
}

impl FeedState {
    pub fn new(client: PriceFeedClient, calculator: MarketCalculator) -> Self {
        Self {
            client,
            calculator,
            latest: Arc::new(RwLock::new(None)),
            poll_interval: market_poll_interval(),
            detail_top_n: detail_top_n(),
            detail_max_concurrency: detail_max_concurrency(),
        }
    }

    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = PriceFeedClient::from_env()?;
        let calculator = MarketCalculator::new(underpriced_threshold())?;
        Ok(Self::new(client, calculator))
    }
}
