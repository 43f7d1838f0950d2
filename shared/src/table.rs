use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
    /// Input order.
    #[default]
    None,
}

impl SortDirection {
    /// Header-click cycle: ascending, descending, back to input order.
    pub fn next(self) -> Self {
        match self {
            SortDirection::None => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
        }
    }
}

/// A cell value as seen by the default comparator.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl SortValue {
    fn kind_rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Text(_) => 1,
            SortValue::Flag(_) => 2,
        }
    }

    /// Total order over cells: numbers, then text, then flags.
    ///
    /// Within a kind, numbers compare numerically with NaN after every other
    /// number, text uses [`locale_cmp`], and flags all tie, so they keep input
    /// order under a stable sort.
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => locale_cmp(a, b),
            (SortValue::Number(a), SortValue::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
            },
            (SortValue::Flag(_), SortValue::Flag(_)) => Ordering::Equal,
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        SortValue::Text(value.to_string())
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        SortValue::Text(value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        SortValue::Number(value)
    }
}

impl From<u32> for SortValue {
    fn from(value: u32) -> Self {
        SortValue::Number(f64::from(value))
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        SortValue::Number(value as f64)
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        SortValue::Flag(value)
    }
}

/// Case-insensitive ordering with lowercase ahead of uppercase on ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

fn compare_cells(a: Option<&SortValue>, b: Option<&SortValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        // Missing values trail in both directions.
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = a.compare(b);
            if direction == SortDirection::Descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

type FieldSelector<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
type SortSelector<T> = Box<dyn Fn(&T) -> Option<SortValue> + Send + Sync>;
type RowPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type RowComparator<T, K> = Box<dyn Fn(&T, &T, &K, SortDirection) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableQueryState<K> {
    pub query: String,
    pub sort_key: Option<K>,
    pub direction: SortDirection,
    pub page: usize,
}

impl<K> Default for TableQueryState<K> {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_key: None,
            direction: SortDirection::None,
            page: 1,
        }
    }
}

/// One rendered page of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage<'a, T> {
    pub items: Vec<&'a T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Search, filter, sort and paginate over a fixed record sequence.
///
/// Every state change re-runs the whole pipeline from the original records,
/// which are never reordered or mutated. Fields are read through selector
/// closures registered with [`searchable`](Self::searchable) and
/// [`sortable`](Self::sortable).
pub struct TableEngine<T, K = &'static str> {
    records: Vec<T>,
    search_fields: Vec<FieldSelector<T>>,
    sort_fields: Vec<(K, SortSelector<T>)>,
    comparator: Option<RowComparator<T, K>>,
    filter: Option<RowPredicate<T>>,
    page_size: usize,
    state: TableQueryState<K>,
    /// Indices into `records` after filter and sort.
    visible: Vec<usize>,
}

impl<T, K: PartialEq> TableEngine<T, K> {
    pub fn new(records: Vec<T>) -> Self {
        let visible = (0..records.len()).collect();
        Self {
            records,
            search_fields: Vec::new(),
            sort_fields: Vec::new(),
            comparator: None,
            filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            state: TableQueryState::default(),
            visible,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, StatsError> {
        self.set_page_size(page_size)?;
        Ok(self)
    }

    pub fn searchable(mut self, field: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.search_fields.push(Box::new(field));
        self.refresh();
        self
    }

    pub fn sortable(
        mut self,
        key: K,
        field: impl Fn(&T) -> Option<SortValue> + Send + Sync + 'static,
    ) -> Self {
        self.sort_fields.push((key, Box::new(field)));
        self.refresh();
        self
    }

    /// Replace the default comparator entirely. The closure receives the
    /// active key and direction and is responsible for both.
    pub fn with_comparator(
        mut self,
        comparator: impl Fn(&T, &T, &K, SortDirection) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Box::new(comparator));
        self.refresh();
        self
    }

    pub fn with_filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.set_filter(predicate);
        self
    }

    /// Update the search text. Always returns to the first page.
    pub fn set_query(&mut self, query: &str) {
        self.state.query = query.trim().to_string();
        self.state.page = 1;
        self.refresh();
    }

    pub fn set_sort(&mut self, key: K, direction: SortDirection) {
        self.state.sort_key = Some(key);
        self.state.direction = direction;
        self.refresh();
    }

    /// Cycle the direction for `key`; switching to a new key starts ascending.
    pub fn toggle_sort(&mut self, key: K) {
        let direction = if self.state.sort_key.as_ref() == Some(&key) {
            self.state.direction.next()
        } else {
            SortDirection::Ascending
        };
        self.set_sort(key, direction);
    }

    pub fn clear_sort(&mut self) {
        self.state.sort_key = None;
        self.state.direction = SortDirection::None;
        self.refresh();
    }

    /// Requested pages outside `1..=total_pages` are clamped.
    pub fn set_page(&mut self, page: usize) {
        self.state.page = page.clamp(1, self.total_pages());
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), StatsError> {
        if page_size == 0 {
            return Err(StatsError::InvalidPageSize);
        }
        self.page_size = page_size;
        self.refresh();
        Ok(())
    }

    pub fn set_filter(&mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) {
        self.filter = Some(Box::new(predicate));
        self.refresh();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.refresh();
    }

    /// Swap in a fresh record set, keeping query, sort and (clamped) page.
    pub fn set_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.refresh();
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn state(&self) -> &TableQueryState<K> {
        &self.state
    }

    pub fn page(&self) -> usize {
        self.state.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Matching records before pagination.
    pub fn total_items(&self) -> usize {
        self.visible.len()
    }

    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    /// Every matching record in display order, across all pages.
    pub fn filtered_items(&self) -> Vec<&T> {
        self.visible.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn page_items(&self) -> Vec<&T> {
        let start = (self.state.page - 1) * self.page_size;
        self.visible
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.records[i])
            .collect()
    }

    /// 1-based positions of the first and last record on the current page.
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.visible.is_empty() {
            return None;
        }
        let first = (self.state.page - 1) * self.page_size + 1;
        let last = (first + self.page_size - 1).min(self.visible.len());
        Some((first, last))
    }

    pub fn view(&self) -> TablePage<'_, T> {
        TablePage {
            items: self.page_items(),
            page: self.state.page,
            page_size: self.page_size,
            total_items: self.total_items(),
            total_pages: self.total_pages(),
        }
    }

    fn refresh(&mut self) {
        let needle = self.state.query.to_lowercase();
        let mut visible: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|&(_, record)| {
                needle.is_empty()
                    || self
                        .search_fields
                        .iter()
                        .any(|field| field(record).to_lowercase().contains(&needle))
            })
            .filter(|&(_, record)| self.filter.as_ref().is_none_or(|keep| keep(record)))
            .map(|(i, _)| i)
            .collect();

        if let Some(key) = self.state.sort_key.as_ref()
            && self.state.direction != SortDirection::None
        {
            let direction = self.state.direction;
            if let Some(comparator) = self.comparator.as_ref() {
                visible.sort_by(|&a, &b| comparator(&self.records[a], &self.records[b], key, direction));
            } else if let Some((_, selector)) = self.sort_fields.iter().find(|(k, _)| k == key) {
                let mut keyed: Vec<(usize, Option<SortValue>)> = visible
                    .iter()
                    .map(|&i| (i, selector(&self.records[i])))
                    .collect();
                keyed.sort_by(|(_, a), (_, b)| compare_cells(a.as_ref(), b.as_ref(), direction));
                visible = keyed.into_iter().map(|(i, _)| i).collect();
            }
        }

        self.visible = visible;
        self.state.page = self.state.page.clamp(1, self.total_pages());
    }
}

impl<T, K: fmt::Debug> fmt::Debug for TableEngine<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableEngine")
            .field("records", &self.records.len())
            .field("visible", &self.visible.len())
            .field("page_size", &self.page_size)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
