use std::time::Duration;

pub const DEFAULT_FEED_BASE_URL: &str = "https://query.idleclans.com/api/";
pub const LATEST_PRICES_PATH: &str = "PlayerMarket/items/prices/latest";
pub const COMPREHENSIVE_PRICES_PATH: &str = "PlayerMarket/items/prices/latest/comprehensive";
pub const PLAYER_PROFILE_PATH: &str = "Player/profile";

pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_FEED_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_MARKET_POLL_INTERVAL_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_DETAIL_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_DETAIL_TOP_N: usize = 5;
pub const MAX_PLAYER_NAME_LEN: usize = 32;

pub fn feed_base_url() -> String {
    std::env::var("FEED_BASE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(|value| {
            if value.ends_with('/') {
                value
            } else {
                format!("{value}/")
            }
        })
        .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string())
}

pub fn feed_timeout() -> Duration {
    std::env::var("FEED_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS))
}

pub fn feed_connect_timeout() -> Duration {
    std::env::var("FEED_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_FEED_CONNECT_TIMEOUT_SECS))
}

pub fn market_poll_interval() -> Duration {
    std::env::var("MARKET_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_MARKET_POLL_INTERVAL_SECS))
}

pub fn underpriced_threshold() -> f64 {
    std::env::var("UNDERPRICED_THRESHOLD")
        .ok()
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| *value > 0.0 && *value <= 1.0)
        .unwrap_or(clanboard_shared::DEFAULT_UNDERPRICED_THRESHOLD)
}

pub fn detail_max_concurrency() -> usize {
    std::env::var("DETAIL_MAX_CONCURRENCY")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_DETAIL_MAX_CONCURRENCY)
}

/// Zero disables order book lookups.
pub fn detail_top_n() -> usize {
    std::env::var("DETAIL_TOP_N")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(DEFAULT_DETAIL_TOP_N)
}

pub fn startup_player() -> Option<String> {
    std::env::var("CLANBOARD_PLAYER")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
