use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use clanboard_shared::{ComprehensiveItemDetail, MarketPriceRecord, PlayerProfile};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::{
    COMPREHENSIVE_PRICES_PATH, LATEST_PRICES_PATH, MAX_PLAYER_NAME_LEN, PLAYER_PROFILE_PATH,
    feed_base_url, feed_connect_timeout, feed_timeout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOperation {
    LatestPrices,
    ItemDetail(u32),
    PlayerProfile,
}

impl fmt::Display for FeedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedOperation::LatestPrices => f.write_str("latest prices"),
            FeedOperation::ItemDetail(item_id) => write!(f, "item detail for {item_id}"),
            FeedOperation::PlayerProfile => f.write_str("player profile"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{operation} timed out after {}ms", timeout.as_millis())]
    Timeout {
        operation: FeedOperation,
        timeout: Duration,
    },

    #[error("{operation} returned HTTP {status}")]
    Status {
        operation: FeedOperation,
        status: reqwest::StatusCode,
    },

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: FeedOperation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned an unreadable payload: {source}")]
    Decode {
        operation: FeedOperation,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid player name `{0}`")]
    InvalidPlayerName(String),

    #[error("invalid feed base URL `{0}`")]
    InvalidBaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FeedError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FeedError::Timeout { .. })
    }

    pub fn operation(&self) -> Option<FeedOperation> {
        match self {
            FeedError::Timeout { operation, .. }
            | FeedError::Status { operation, .. }
            | FeedError::Transport { operation, .. }
            | FeedError::Decode { operation, .. } => Some(*operation),
            FeedError::InvalidPlayerName(_)
            | FeedError::InvalidBaseUrl(_)
            | FeedError::Client(_) => None,
        }
    }
}

/// Strictly increasing millisecond stamps for the cache-busting query parameter.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        now.max(previous + 1)
    }
}

/// Client for the game's public market and player endpoints.
///
/// The upstream caches aggressively, so every request carries no-cache
/// headers and a fresh `_` query stamp. Each call is bounded by `timeout`;
/// nothing is retried.
#[derive(Debug, Clone)]
pub struct PriceFeedClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    timeout: Duration,
    cache_buster: Arc<CacheBuster>,
}

impl PriceFeedClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, FeedError> {
        let base_url = reqwest::Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| FeedError::InvalidBaseUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("clanboard/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(FeedError::Client)?;
        Ok(Self {
            http,
            base_url,
            timeout,
            cache_buster: Arc::new(CacheBuster::default()),
        })
    }

    pub fn from_env() -> Result<Self, FeedError> {
        Self::new(&feed_base_url(), feed_timeout(), feed_connect_timeout())
    }

    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn latest_prices(&self) -> Result<Vec<MarketPriceRecord>, FeedError> {
        let url = self.endpoint(LATEST_PRICES_PATH, &[])?;
        self.get_json(FeedOperation::LatestPrices, url).await
    }

    /// Order book for one item, sell side ascending and buy side descending.
    pub async fn item_detail(&self, item_id: u32) -> Result<ComprehensiveItemDetail, FeedError> {
        let id = item_id.to_string();
        let url = self.endpoint(COMPREHENSIVE_PRICES_PATH, &[id.as_str()])?;
        let detail: ComprehensiveItemDetail =
            self.get_json(FeedOperation::ItemDetail(item_id), url).await?;
        Ok(detail.normalized())
    }

    pub async fn player_profile(&self, name: &str) -> Result<PlayerProfile, FeedError> {
        let name = normalize_player_name(name)?;
        let url = self.endpoint(PLAYER_PROFILE_PATH, &[name])?;
        self.get_json(FeedOperation::PlayerProfile, url).await
    }

    fn endpoint(&self, path: &str, extra_segments: &[&str]) -> Result<reqwest::Url, FeedError> {
        let mut url = self.base_url.clone();
        let Ok(mut path_segments) = url.path_segments_mut() else {
            return Err(FeedError::InvalidBaseUrl(self.base_url.to_string()));
        };
        path_segments.pop_if_empty();
        path_segments.extend(path.split('/'));
        path_segments.extend(extra_segments);
        drop(path_segments);

        url.query_pairs_mut()
            .append_pair("_", &self.cache_buster.next().to_string());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: FeedOperation,
        url: reqwest::Url,
    ) -> Result<T, FeedError> {
        debug!(%operation, %url, "requesting feed");
        let request = async {
            let resp = self
                .http
                .get(url)
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache")
                .send()
                .await
                .map_err(|source| self.transport_error(operation, source))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FeedError::Status { operation, status });
            }

            let body = resp
                .bytes()
                .await
                .map_err(|source| self.transport_error(operation, source))?;
            serde_json::from_slice(&body).map_err(|source| FeedError::Decode { operation, source })
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }

    fn transport_error(&self, operation: FeedOperation, source: reqwest::Error) -> FeedError {
        if source.is_timeout() {
            FeedError::Timeout {
                operation,
                timeout: self.timeout,
            }
        } else {
            FeedError::Transport { operation, source }
        }
    }
}

fn normalize_player_name(name: &str) -> Result<&str, FeedError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_PLAYER_NAME_LEN {
        return Err(FeedError::InvalidPlayerName(name.to_string()));
    }

    if trimmed
        .chars()
        .any(|ch| ch.is_control() || matches!(ch, '/' | '\\' | '?' | '#'))
    {
        return Err(FeedError::InvalidPlayerName(name.to_string()));
    }

    Ok(trimmed)
}
