use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::StatsError;
use crate::vocab::CategoryScheme;

/// Counters that landed in one category, plus their sum.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Bucket {
    pub entries: BTreeMap<String, f64>,
    pub total: f64,
}

impl Bucket {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Every bucket of scheme `C`, including empty ones.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedGroup<C: CategoryScheme> {
    buckets: BTreeMap<C, Bucket>,
}

impl<C: CategoryScheme> CategorizedGroup<C> {
    pub fn bucket(&self, category: C) -> Option<&Bucket> {
        self.buckets.get(&category)
    }

    pub fn total(&self, category: C) -> f64 {
        self.bucket(category).map_or(0.0, |bucket| bucket.total)
    }

    pub fn grand_total(&self) -> f64 {
        self.buckets.values().map(|bucket| bucket.total).sum()
    }

    /// Number of counters across all buckets.
    pub fn counter_count(&self) -> usize {
        self.buckets.values().map(Bucket::len).sum()
    }

    /// Category a counter was placed in, if it was part of the input.
    pub fn category_of(&self, name: &str) -> Option<C> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.entries.contains_key(name))
            .map(|(category, _)| *category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (C, &Bucket)> {
        self.buckets.iter().map(|(category, bucket)| (*category, bucket))
    }
}

impl<C: CategoryScheme> Serialize for CategorizedGroup<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (category, bucket) in &self.buckets {
            map.serialize_entry(category.key(), bucket)?;
        }
        map.end()
    }
}

/// Sort named counters into the buckets of `C`.
///
/// Each name goes to the first declared bucket listing it, otherwise to
/// `C::RESIDUAL`. Every input counter ends up in exactly one bucket. Names
/// match without regard to ASCII case, so `attack` and `Attack` are the same
/// counter and the second one is rejected.
pub fn categorize<C, I, K, V>(counters: I) -> Result<CategorizedGroup<C>, StatsError>
where
    C: CategoryScheme,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let mut buckets: BTreeMap<C, Bucket> = C::all()
        .into_iter()
        .map(|category| (category, Bucket::default()))
        .collect();
    let mut seen = HashSet::new();

    for (name, value) in counters {
        let name = name.as_ref();
        let value = *value.borrow();
        if !value.is_finite() {
            return Err(StatsError::InvalidCounter {
                name: name.to_string(),
                value,
            });
        }

        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(StatsError::DuplicateCounter(name.to_string()));
        }

        let bucket = buckets.entry(C::classify(name)).or_default();
        bucket.entries.insert(name.to_string(), value);
        bucket.total += value;
    }

    Ok(CategorizedGroup { buckets })
}
