use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

const BUNDLED_ITEMS_JSON: &str = include_str!("../data/items.json");

/// Built on first access, then shared read-only for the rest of the process.
static BUNDLED: LazyLock<Result<ItemCatalog, StatsError>> =
    LazyLock::new(|| ItemCatalog::from_json(BUNDLED_ITEMS_JSON));

/// Static reference data for one tradeable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCatalogEntry {
    pub item_id: u32,
    pub name: String,
    /// Coins paid by the game when the item is sold to a shop.
    pub game_sell_value: f64,
    #[serde(default)]
    pub category: Vec<String>,
}

impl ItemCatalogEntry {
    pub fn category_label(&self) -> String {
        self.category.join(" / ")
    }
}

/// Item reference data indexed by item id.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    entries: HashMap<u32, ItemCatalogEntry>,
}

impl ItemCatalog {
    /// The catalog shipped with the crate.
    pub fn bundled() -> Result<&'static ItemCatalog, StatsError> {
        BUNDLED.as_ref().map_err(Clone::clone)
    }

    pub fn from_json(json: &str) -> Result<Self, StatsError> {
        let entries: Vec<ItemCatalogEntry> =
            serde_json::from_str(json).map_err(|e| StatsError::Catalog(e.to_string()))?;
        Self::from_entries(entries)
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = ItemCatalogEntry>,
    ) -> Result<Self, StatsError> {
        let mut indexed = HashMap::new();
        for entry in entries {
            if !entry.game_sell_value.is_finite() || entry.game_sell_value < 0.0 {
                return Err(StatsError::Catalog(format!(
                    "item {} has invalid sell value {}",
                    entry.item_id, entry.game_sell_value
                )));
            }
            let item_id = entry.item_id;
            if indexed.insert(item_id, entry).is_some() {
                return Err(StatsError::Catalog(format!("duplicate item id {item_id}")));
            }
        }
        Ok(Self { entries: indexed })
    }

    pub fn get(&self, item_id: u32) -> Option<&ItemCatalogEntry> {
        self.entries.get(&item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by item id.
    pub fn sorted_entries(&self) -> Vec<&ItemCatalogEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.item_id);
        entries
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&ItemCatalogEntry> {
        let name = name.trim();
        self.entries
            .values()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}
