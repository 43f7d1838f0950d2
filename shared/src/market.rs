use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{ItemCatalog, ItemCatalogEntry};
use crate::error::StatsError;
use crate::table::{SortValue, TableEngine};

/// Price below this fraction of the 24h average counts as underpriced.
pub const DEFAULT_UNDERPRICED_THRESHOLD: f64 = 0.8;

/// Latest order book summary for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPriceRecord {
    pub item_id: u32,
    #[serde(default)]
    pub lowest_sell_price: f64,
    #[serde(default)]
    pub highest_buy_price: f64,
    #[serde(default, rename = "averagePrice1Day")]
    pub average_price_1d: Option<f64>,
    #[serde(default, rename = "averagePrice7Days")]
    pub average_price_7d: Option<f64>,
    #[serde(default, rename = "averagePrice30Days")]
    pub average_price_30d: Option<f64>,
    #[serde(default, rename = "tradeVolume1Day")]
    pub trade_volume_1d: Option<f64>,
}

impl MarketPriceRecord {
    /// Cheapest listing, or `None` when nothing is listed.
    pub fn current_price(&self) -> Option<f64> {
        (self.lowest_sell_price.is_finite() && self.lowest_sell_price > 0.0)
            .then_some(self.lowest_sell_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Full order book for one item: sell levels ascending, buy levels descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveItemDetail {
    pub item_id: u32,
    #[serde(default)]
    pub lowest_sell_pricing: Vec<PriceLevel>,
    #[serde(default)]
    pub highest_buy_pricing: Vec<PriceLevel>,
    #[serde(default, rename = "averagePrice1Day")]
    pub average_price_1d: Option<f64>,
    #[serde(default, rename = "averagePrice7Days")]
    pub average_price_7d: Option<f64>,
    #[serde(default, rename = "averagePrice30Days")]
    pub average_price_30d: Option<f64>,
    #[serde(default, rename = "tradeVolume1Day")]
    pub trade_volume_1d: Option<f64>,
}

impl ComprehensiveItemDetail {
    pub fn is_well_ordered(&self) -> bool {
        self.lowest_sell_pricing
            .windows(2)
            .all(|pair| pair[0].price <= pair[1].price)
            && self
                .highest_buy_pricing
                .windows(2)
                .all(|pair| pair[0].price >= pair[1].price)
    }

    /// Reorder both sides of the book if the feed did not.
    pub fn normalized(mut self) -> Self {
        self.lowest_sell_pricing
            .sort_by(|a, b| a.price.total_cmp(&b.price));
        self.highest_buy_pricing
            .sort_by(|a, b| b.price.total_cmp(&a.price));
        self
    }

    pub fn best_sell(&self) -> Option<f64> {
        self.lowest_sell_pricing.first().map(|level| level.price)
    }

    pub fn best_buy(&self) -> Option<f64> {
        self.highest_buy_pricing.first().map(|level| level.price)
    }

    /// Gap between the cheapest listing and the best bid.
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_sell()? - self.best_buy()?)
    }
}

/// Market price compared with what the game pays for the item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitableRow {
    pub item_id: u32,
    pub name: String,
    pub category: String,
    pub current_price: f64,
    pub game_sell_value: f64,
    pub profit_each: f64,
    /// `None` when the item has no sell value to compare against.
    pub profit_percent: Option<f64>,
    pub trade_volume_1d: Option<f64>,
}

/// Current price compared with the trailing 24h average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderpricedRow {
    pub item_id: u32,
    pub name: String,
    pub current_price: f64,
    pub average_price_1d: f64,
    pub price_ratio: f64,
    pub discount_percent: f64,
    pub is_underpriced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfitColumn {
    Name,
    Price,
    SellValue,
    ProfitEach,
    ProfitPercent,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnderpricedColumn {
    Name,
    Price,
    Average,
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketCalculator {
    underpriced_threshold: f64,
}

impl Default for MarketCalculator {
    fn default() -> Self {
        Self {
            underpriced_threshold: DEFAULT_UNDERPRICED_THRESHOLD,
        }
    }
}

impl MarketCalculator {
    pub fn new(underpriced_threshold: f64) -> Result<Self, StatsError> {
        if !(underpriced_threshold > 0.0 && underpriced_threshold <= 1.0) {
            return Err(StatsError::InvalidThreshold(underpriced_threshold));
        }
        Ok(Self {
            underpriced_threshold,
        })
    }

    pub fn underpriced_threshold(&self) -> f64 {
        self.underpriced_threshold
    }

    pub fn profit_row(&self, entry: &ItemCatalogEntry, price: &MarketPriceRecord) -> ProfitableRow {
        let current_price = price.lowest_sell_price;
        let profit_each = current_price - entry.game_sell_value;
        let profit_percent = ratio(profit_each, entry.game_sell_value).map(|r| r * 100.0);
        ProfitableRow {
            item_id: entry.item_id,
            name: entry.name.clone(),
            category: entry.category_label(),
            current_price,
            game_sell_value: entry.game_sell_value,
            profit_each,
            profit_percent,
            trade_volume_1d: price.trade_volume_1d,
        }
    }

    /// `None` when there is no usable 24h average or current price.
    pub fn underpriced_row(
        &self,
        entry: &ItemCatalogEntry,
        price: &MarketPriceRecord,
    ) -> Option<UnderpricedRow> {
        let current_price = price.current_price()?;
        let average_price_1d = price.average_price_1d?;
        let price_ratio = ratio(current_price, average_price_1d)?;
        Some(UnderpricedRow {
            item_id: entry.item_id,
            name: entry.name.clone(),
            current_price,
            average_price_1d,
            price_ratio,
            discount_percent: (1.0 - price_ratio) * 100.0,
            is_underpriced: price_ratio < self.underpriced_threshold,
        })
    }

    /// Items that sell on the market for more than the game pays, best first.
    pub fn profitable_rows(
        &self,
        catalog: &ItemCatalog,
        prices: &[MarketPriceRecord],
    ) -> Vec<ProfitableRow> {
        let mut rows: Vec<ProfitableRow> = join(catalog, prices)
            .filter(|(_, price)| {
                let listed = price.current_price().is_some();
                if !listed {
                    debug!(item_id = price.item_id, "skipping item without listings");
                }
                listed
            })
            .map(|(entry, price)| self.profit_row(entry, price))
            .filter(|row| row.profit_each > 0.0)
            .collect();
        rows.sort_by(|a, b| b.profit_each.total_cmp(&a.profit_each));
        rows
    }

    /// Items listed below the threshold fraction of their 24h average,
    /// deepest discount first.
    pub fn underpriced_rows(
        &self,
        catalog: &ItemCatalog,
        prices: &[MarketPriceRecord],
    ) -> Vec<UnderpricedRow> {
        let mut rows: Vec<UnderpricedRow> = join(catalog, prices)
            .filter_map(|(entry, price)| self.underpriced_row(entry, price))
            .filter(|row| row.is_underpriced)
            .collect();
        rows.sort_by(|a, b| a.price_ratio.total_cmp(&b.price_ratio));
        rows
    }
}

fn join<'a>(
    catalog: &'a ItemCatalog,
    prices: &'a [MarketPriceRecord],
) -> impl Iterator<Item = (&'a ItemCatalogEntry, &'a MarketPriceRecord)> {
    prices.iter().filter_map(|price| {
        let entry = catalog.get(price.item_id);
        if entry.is_none() {
            debug!(item_id = price.item_id, "price record has no catalog entry");
        }
        entry.map(|entry| (entry, price))
    })
}

/// `numerator / denominator`, or `None` when the result would not be finite.
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

pub fn profit_table(rows: Vec<ProfitableRow>) -> TableEngine<ProfitableRow, ProfitColumn> {
    TableEngine::new(rows)
        .searchable(|row| row.name.clone())
        .searchable(|row| row.category.clone())
        .sortable(ProfitColumn::Name, |row| Some(row.name.as_str().into()))
        .sortable(ProfitColumn::Price, |row| Some(row.current_price.into()))
        .sortable(ProfitColumn::SellValue, |row| Some(row.game_sell_value.into()))
        .sortable(ProfitColumn::ProfitEach, |row| Some(row.profit_each.into()))
        .sortable(ProfitColumn::ProfitPercent, |row| {
            row.profit_percent.map(SortValue::from)
        })
        .sortable(ProfitColumn::Volume, |row| row.trade_volume_1d.map(SortValue::from))
}

pub fn underpriced_table(rows: Vec<UnderpricedRow>) -> TableEngine<UnderpricedRow, UnderpricedColumn> {
    TableEngine::new(rows)
        .searchable(|row| row.name.clone())
        .sortable(UnderpricedColumn::Name, |row| Some(row.name.as_str().into()))
        .sortable(UnderpricedColumn::Price, |row| Some(row.current_price.into()))
        .sortable(UnderpricedColumn::Average, |row| {
            Some(row.average_price_1d.into())
        })
        .sortable(UnderpricedColumn::Ratio, |row| Some(row.price_ratio.into()))
}

#[cfg(test)]
mod tests {
    use super::{
        ComprehensiveItemDetail, MarketCalculator, MarketPriceRecord, PriceLevel, ProfitColumn,
        profit_table,
    };
    use crate::catalog::{ItemCatalog, ItemCatalogEntry};
    use crate::error::StatsError;
    use crate::table::SortDirection;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn entry(item_id: u32, name: &str, value: f64) -> ItemCatalogEntry {
        ItemCatalogEntry {
            item_id,
            name: name.to_string(),
            game_sell_value: value,
            category: vec!["Resources".to_string()],
        }
    }

    fn price(item_id: u32, lowest_sell: f64, average_1d: Option<f64>) -> MarketPriceRecord {
        MarketPriceRecord {
            item_id,
            lowest_sell_price: lowest_sell,
            highest_buy_price: lowest_sell * 0.9,
            average_price_1d: average_1d,
            average_price_7d: None,
            average_price_30d: None,
            trade_volume_1d: Some(100.0),
        }
    }

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_entries([
            entry(1, "Oak log", 5.0),
            entry(2, "Iron bar", 24.0),
            entry(3, "Ancient scroll", 0.0),
            entry(4, "Gold bar", 110.0),
        ])
        .unwrap()
    }

    #[test]
    fn profit_row_computes_margin_and_percent() {
        let row = MarketCalculator::default().profit_row(&entry(1, "Oak log", 5.0), &price(1, 8.0, None));
        assert_close(row.profit_each, 3.0);
        assert_close(row.profit_percent.unwrap(), 60.0);
        assert_eq!(row.category, "Resources");
    }

    #[test]
    fn zero_sell_value_has_no_profit_percent() {
        let row = MarketCalculator::default()
            .profit_row(&entry(3, "Ancient scroll", 0.0), &price(3, 40.0, None));
        assert_close(row.profit_each, 40.0);
        assert_eq!(row.profit_percent, None);
    }

    #[test]
    fn underpriced_ratio_against_daily_average() {
        let calc = MarketCalculator::default();
        let row = calc
            .underpriced_row(&entry(2, "Iron bar", 24.0), &price(2, 30.0, Some(50.0)))
            .unwrap();
        assert_close(row.price_ratio, 0.6);
        assert_close(row.discount_percent, 40.0);
        assert!(row.is_underpriced);

        let fair = calc
            .underpriced_row(&entry(2, "Iron bar", 24.0), &price(2, 45.0, Some(50.0)))
            .unwrap();
        assert!(!fair.is_underpriced);
    }

    #[test]
    fn underpriced_row_omitted_without_average() {
        let calc = MarketCalculator::default();
        let item = entry(2, "Iron bar", 24.0);
        assert!(calc.underpriced_row(&item, &price(2, 30.0, None)).is_none());
        assert!(calc.underpriced_row(&item, &price(2, 30.0, Some(0.0))).is_none());
        assert!(calc.underpriced_row(&item, &price(2, 0.0, Some(50.0))).is_none());
    }

    #[test]
    fn profitable_rows_join_catalog_and_skip_unknowns() {
        let prices = [
            price(1, 8.0, Some(9.0)),
            price(2, 20.0, Some(22.0)),
            price(3, 40.0, None),
            price(4, 0.0, Some(150.0)),
            price(99, 1000.0, Some(1000.0)),
        ];
        let rows = MarketCalculator::default().profitable_rows(&catalog(), &prices);
        let ids: Vec<u32> = rows.iter().map(|row| row.item_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(rows.iter().all(|row| row.profit_each > 0.0));
    }

    #[test]
    fn underpriced_rows_sorted_by_ratio() {
        let prices = [
            price(1, 4.0, Some(5.0)),
            price(2, 12.0, Some(24.0)),
            price(4, 70.0, Some(100.0)),
            price(3, 10.0, None),
        ];
        let rows = MarketCalculator::default().underpriced_rows(&catalog(), &prices);
        let ids: Vec<u32> = rows.iter().map(|row| row.item_id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(rows.iter().all(|row| row.price_ratio.is_finite()));
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(MarketCalculator::new(0.5).is_ok());
        assert!(MarketCalculator::new(1.0).is_ok());
        assert_eq!(
            MarketCalculator::new(0.0),
            Err(StatsError::InvalidThreshold(0.0))
        );
        assert!(MarketCalculator::new(f64::NAN).is_err());
        assert!(MarketCalculator::new(1.5).is_err());
    }

    #[test]
    fn price_record_deserializes_feed_field_names() {
        let json = r#"{
            "itemId": 21,
            "lowestSellPrice": 12,
            "highestBuyPrice": 10,
            "averagePrice1Day": 11.5,
            "averagePrice7Days": 11.0,
            "tradeVolume1Day": 420
        }"#;
        let record: MarketPriceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.item_id, 21);
        assert_eq!(record.average_price_1d, Some(11.5));
        assert_eq!(record.average_price_30d, None);
        assert_eq!(record.current_price(), Some(12.0));
    }

    #[test]
    fn comprehensive_detail_orders_book_and_reports_spread() {
        let detail = ComprehensiveItemDetail {
            item_id: 4,
            lowest_sell_pricing: vec![
                PriceLevel { price: 120.0, volume: 3 },
                PriceLevel { price: 115.0, volume: 1 },
            ],
            highest_buy_pricing: vec![
                PriceLevel { price: 100.0, volume: 2 },
                PriceLevel { price: 108.0, volume: 5 },
            ],
            average_price_1d: Some(117.0),
            average_price_7d: None,
            average_price_30d: None,
            trade_volume_1d: None,
        };
        assert!(!detail.is_well_ordered());

        let detail = detail.normalized();
        assert!(detail.is_well_ordered());
        assert_eq!(detail.best_sell(), Some(115.0));
        assert_eq!(detail.best_buy(), Some(108.0));
        assert_close(detail.spread().unwrap(), 7.0);
    }

    #[test]
    fn empty_book_has_no_spread() {
        let detail: ComprehensiveItemDetail = serde_json::from_str(r#"{"itemId": 4}"#).unwrap();
        assert!(detail.is_well_ordered());
        assert_eq!(detail.spread(), None);
    }

    #[test]
    fn profit_table_sorts_missing_percent_last() {
        let calc = MarketCalculator::default();
        let rows = vec![
            calc.profit_row(&entry(3, "Ancient scroll", 0.0), &price(3, 40.0, None)),
            calc.profit_row(&entry(1, "Oak log", 5.0), &price(1, 8.0, None)),
            calc.profit_row(&entry(2, "Iron bar", 24.0), &price(2, 48.0, None)),
        ];
        let mut table = profit_table(rows);
        table.set_sort(ProfitColumn::ProfitPercent, SortDirection::Descending);
        let ids: Vec<u32> = table.page_items().iter().map(|row| row.item_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        table.set_query("scroll");
        assert_eq!(table.total_items(), 1);
    }
}
