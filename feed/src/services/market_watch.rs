use std::collections::HashSet;

use chrono::Utc;
use clanboard_shared::format::{format_compact, format_percent};
use clanboard_shared::{
    ItemCatalog, MarketCalculator, MarketPriceRecord, ProfitColumn, SortDirection, UnderpricedRow,
    profit_table,
};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::client::FeedError;
use crate::state::{FeedState, MarketSnapshot};

const LOGGED_OPPORTUNITIES: usize = 5;

pub async fn run(state: FeedState) {
    let catalog = match ItemCatalog::bundled() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "item catalog unavailable; market watch disabled");
            return;
        }
    };
    info!(items = catalog.len(), "loaded item catalog");

    let mut interval = tokio::time::interval(state.poll_interval);

    // Poll immediately on startup, then on every tick
    loop {
        interval.tick().await;

        match poll_once(&state, catalog).await {
            Ok(snapshot) => {
                log_top_opportunities(&snapshot);
                inspect_order_books(&state, &snapshot).await;
            }
            Err(e) if e.is_timeout() => {
                warn!(
                    operation = ?e.operation(),
                    error = %e,
                    "market price feed timed out; waiting for next poll"
                );
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch market prices");
            }
        }
    }
}

/// Fetch latest prices and publish a fresh snapshot.
pub async fn poll_once(
    state: &FeedState,
    catalog: &ItemCatalog,
) -> Result<MarketSnapshot, FeedError> {
    let prices = state.client.latest_prices().await?;
    let snapshot = build_snapshot(&state.calculator, catalog, &prices);
    info!(
        fetched_at = %snapshot.fetched_at,
        records = snapshot.record_count,
        profitable = snapshot.profitable.len(),
        underpriced = snapshot.underpriced.len(),
        "market snapshot updated"
    );

    let mut latest = state.latest.write().await;
    for row in newly_underpriced(latest.as_ref(), &snapshot) {
        info!(
            item_id = row.item_id,
            name = %row.name,
            price = %format_compact(row.current_price),
            discount = %format_percent(Some(row.discount_percent)),
            "item dropped below 24h average"
        );
    }
    *latest = Some(snapshot.clone());
    Ok(snapshot)
}

/// Underpriced rows of `current` that were not underpriced in `previous`.
///
/// With no previous snapshot nothing is reported, so startup does not flood
/// the log with every existing discount.
pub fn newly_underpriced<'a>(
    previous: Option<&MarketSnapshot>,
    current: &'a MarketSnapshot,
) -> Vec<&'a UnderpricedRow> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    let known: HashSet<u32> = previous.underpriced.iter().map(|row| row.item_id).collect();
    current
        .underpriced
        .iter()
        .filter(|row| !known.contains(&row.item_id))
        .collect()
}

pub fn build_snapshot(
    calculator: &MarketCalculator,
    catalog: &ItemCatalog,
    prices: &[MarketPriceRecord],
) -> MarketSnapshot {
    MarketSnapshot {
        fetched_at: Utc::now(),
        record_count: prices.len(),
        profitable: calculator.profitable_rows(catalog, prices),
        underpriced: calculator.underpriced_rows(catalog, prices),
    }
}

fn log_top_opportunities(snapshot: &MarketSnapshot) {
    let mut table = profit_table(snapshot.profitable.clone());
    table.set_sort(ProfitColumn::ProfitPercent, SortDirection::Descending);
    for row in table.page_items().into_iter().take(LOGGED_OPPORTUNITIES) {
        info!(
            item_id = row.item_id,
            name = %row.name,
            price = %format_compact(row.current_price),
            profit_each = %format_compact(row.profit_each),
            profit_percent = %format_percent(row.profit_percent),
            "market sells above shop value"
        );
    }

    for row in snapshot.underpriced.iter().take(LOGGED_OPPORTUNITIES) {
        info!(
            item_id = row.item_id,
            name = %row.name,
            price = %format_compact(row.current_price),
            average_1d = %format_compact(row.average_price_1d),
            discount = %format_percent(Some(row.discount_percent)),
            "listed below 24h average"
        );
    }
}

/// Pull order books for the deepest discounts with bounded concurrency.
async fn inspect_order_books(state: &FeedState, snapshot: &MarketSnapshot) {
    if state.detail_top_n == 0 {
        return;
    }

    let item_ids: Vec<u32> = snapshot
        .underpriced
        .iter()
        .take(state.detail_top_n)
        .map(|row| row.item_id)
        .collect();

    let results: Vec<_> = stream::iter(item_ids)
        .map(|item_id| {
            let client = state.client.clone();
            async move { (item_id, client.item_detail(item_id).await) }
        })
        .buffer_unordered(state.detail_max_concurrency.max(1))
        .collect()
        .await;

    for (item_id, result) in results {
        match result {
            Ok(detail) => {
                info!(
                    item_id,
                    best_sell = ?detail.best_sell(),
                    best_buy = ?detail.best_buy(),
                    spread = ?detail.spread(),
                    "order book"
                );
            }
            Err(e) => {
                warn!(item_id, timed_out = e.is_timeout(), error = %e, "failed to fetch order book");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::routing::get;
    use clanboard_shared::{ItemCatalog, ItemCatalogEntry, MarketCalculator, MarketPriceRecord};

    use super::{build_snapshot, newly_underpriced, poll_once};
    use crate::client::PriceFeedClient;
    use crate::state::FeedState;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_entries([
            ItemCatalogEntry {
                item_id: 2,
                name: "Oak log".to_string(),
                game_sell_value: 5.0,
                category: vec!["Resources".to_string(), "Logs".to_string()],
            },
            ItemCatalogEntry {
                item_id: 41,
                name: "Iron bar".to_string(),
                game_sell_value: 24.0,
                category: vec!["Resources".to_string(), "Bars".to_string()],
            },
        ])
        .expect("test catalog")
    }

    fn record(item_id: u32, lowest_sell: f64, average_1d: Option<f64>) -> MarketPriceRecord {
        MarketPriceRecord {
            item_id,
            lowest_sell_price: lowest_sell,
            highest_buy_price: 0.0,
            average_price_1d: average_1d,
            average_price_7d: None,
            average_price_30d: None,
            trade_volume_1d: None,
        }
    }

    async fn spawn_test_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    #[test]
    fn snapshot_splits_profitable_and_underpriced() {
        let prices = [
            record(2, 8.0, Some(8.5)),
            record(41, 15.0, Some(30.0)),
            record(999, 1.0, Some(100.0)),
        ];
        let snapshot = build_snapshot(&MarketCalculator::default(), &catalog(), &prices);
        assert_eq!(snapshot.record_count, 3);
        assert_eq!(snapshot.profitable.len(), 1);
        assert_eq!(snapshot.profitable[0].item_id, 2);
        assert_eq!(snapshot.underpriced.len(), 1);
        assert_eq!(snapshot.underpriced[0].item_id, 41);
    }

    #[tokio::test]
    async fn poll_once_publishes_snapshot() {
        let app = Router::new().route(
            "/api/PlayerMarket/items/prices/latest",
            get(|| async {
                r#"[{"itemId": 2, "lowestSellPrice": 9, "highestBuyPrice": 7, "averagePrice1Day": 9}]"#
            }),
        );
        let (addr, server) = spawn_test_server(app).await;
        let client = PriceFeedClient::new(
            &format!("http://{addr}/api/"),
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .expect("test client");
        let state = FeedState::new(client, MarketCalculator::default());

        let snapshot = poll_once(&state, &catalog()).await.expect("poll");
        assert_eq!(snapshot.profitable.len(), 1);

        let latest = state.latest.read().await;
        let published = latest.as_ref().expect("snapshot published");
        assert_eq!(published.record_count, 1);
        assert_eq!(published.profitable[0].profit_each, 4.0);

        server.abort();
    }

    #[test]
    fn only_fresh_discounts_are_reported() {
        let calculator = MarketCalculator::default();
        let first = build_snapshot(&calculator, &catalog(), &[record(41, 15.0, Some(30.0))]);
        assert!(newly_underpriced(None, &first).is_empty());

        let second = build_snapshot(
            &calculator,
            &catalog(),
            &[record(2, 3.0, Some(8.0)), record(41, 14.0, Some(30.0))],
        );
        let fresh: Vec<u32> = newly_underpriced(Some(&first), &second)
            .into_iter()
            .map(|row| row.item_id)
            .collect();
        assert_eq!(fresh, vec![2]);
        assert!(newly_underpriced(Some(&second), &second).is_empty());
    }

    #[tokio::test]
    async fn second_poll_replaces_previous_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/api/PlayerMarket/items/prices/latest",
            get({
                let calls = Arc::clone(&calls);
                move || {
                    let call = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if call == 0 {
                            r#"[{"itemId": 41, "lowestSellPrice": 30, "averagePrice1Day": 30}]"#
                        } else {
                            r#"[{"itemId": 41, "lowestSellPrice": 12, "averagePrice1Day": 30}]"#
                        }
                    }
                }
            }),
        );
        let (addr, server) = spawn_test_server(app).await;
        let client = PriceFeedClient::new(
            &format!("http://{addr}/api/"),
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .expect("test client");
        let state = FeedState::new(client, MarketCalculator::default());

        let first = poll_once(&state, &catalog()).await.expect("first poll");
        assert!(first.underpriced.is_empty());

        let second = poll_once(&state, &catalog()).await.expect("second poll");
        assert_eq!(newly_underpriced(Some(&first), &second).len(), 1);

        let latest = state.latest.read().await;
        let published = latest.as_ref().expect("snapshot published");
        assert_eq!(published.underpriced[0].item_id, 41);
        assert_eq!(published.fetched_at, second.fetched_at);

        server.abort();
    }

    #[tokio::test]
    async fn failed_poll_publishes_nothing() {
        let app = Router::new();
        let (addr, server) = spawn_test_server(app).await;
        let client = PriceFeedClient::new(
            &format!("http://{addr}/api/"),
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .expect("test client");
        let state = FeedState::new(client, MarketCalculator::default());

        let err = poll_once(&state, &catalog()).await.unwrap_err();
        assert!(!err.is_timeout());
        assert!(state.latest.read().await.is_none());

        server.abort();
    }
}
