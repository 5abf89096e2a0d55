//! Data models for the survey aggregator.
//!
//! This module contains the derived data structures produced by the
//! aggregations and the interchange document that ties them together.
//! Counts are held as `usize` while computing and converted to `u64`
//! in one place, the `Serialize` impl of [`Count`].

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Version tag written into every interchange document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// A non-negative occurrence count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Count(pub usize);

impl Count {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count(n)
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0 as u64)
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u64::deserialize(deserializer)?;
        usize::try_from(n)
            .map(Count)
            .map_err(|_| serde::de::Error::custom(format!("count {} out of range", n)))
    }
}

/// An insertion-ordered string-keyed map.
///
/// Serializes as a JSON object whose key order is the insertion order, and
/// deserializes back into the same order, so ranked data survives a round
/// trip through the interchange document.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Keys are expected to be unique; callers build
    /// these maps from already-grouped data.
    pub fn push(&mut self, key: impl Into<String>, value: V) {
        self.entries.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<(&str, &V)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map with string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            entries.push((k, v));
        }
        Ok(OrderedMap { entries })
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Token → count, ranked by count descending.
pub type FrequencyMap = OrderedMap<Count>;

impl OrderedMap<Count> {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.values().map(|c| c.get()).sum()
    }

    /// Largest count, used to scale bars.
    pub fn max_count(&self) -> usize {
        self.values().map(|c| c.get()).max().unwrap_or(0)
    }
}

/// One row of a single-answer tally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub count: Count,
    /// Share of the non-absent answers, 0-100.
    pub percentage: f64,
}

/// Answer → count and percentage, ranked by count descending.
pub type Tally = OrderedMap<TallyEntry>;

impl OrderedMap<TallyEntry> {
    /// Number of non-absent answers the tally was built from.
    pub fn answered(&self) -> usize {
        self.values().map(|e| e.count.get()).sum()
    }
}

/// Cohort → (category → count).
///
/// Every cohort row lists every observed category, zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrossTab {
    pub rows: OrderedMap<FrequencyMap>,
}

impl CrossTab {
    /// Each cohort's counts divided by that cohort's row total, times 100.
    pub fn row_percentages(&self) -> OrderedMap<OrderedMap<f64>> {
        self.rows
            .iter()
            .map(|(cohort, row)| {
                let total = row.total();
                let pct = row
                    .iter()
                    .map(|(category, count)| {
                        let p = if total == 0 {
                            0.0
                        } else {
                            count.get() as f64 / total as f64 * 100.0
                        };
                        (category.to_string(), p)
                    })
                    .collect();
                (cohort.to_string(), pct)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The most mentioned course inside one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCourse {
    pub course: String,
    pub count: Count,
}

/// Metadata about the interchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsMeta {
    /// When the aggregations were computed.
    pub generated_at: DateTime<Utc>,
    pub version: String,
    /// Respondents left after dropping empty rows.
    pub total_responses: Count,
    /// File name of the survey export.
    pub source: String,
    /// Aggregations that degraded to an empty result, and why.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_responses: Count,
    pub with_prior_experience: Count,
    pub top_modality: Option<String>,
    pub top_modality_count: Count,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub modality: Tally,
    pub willingness: Tally,
    pub schedules: FrequencyMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortBreakdown {
    /// Rows per cohort.
    pub respondents: FrequencyMap,
    pub preferred_modality: OrderedMap<String>,
    pub willingness: CrossTab,
    pub willingness_percentages: OrderedMap<OrderedMap<f64>>,
    pub top_course: OrderedMap<TopCourse>,
}

/// The complete results document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub meta: ResultsMeta,
    pub summary: Summary,
    pub preferences: Preferences,
    /// Area label → respondents who answered that area.
    pub interest_by_area: FrequencyMap,
    /// Area key → top courses.
    pub popular_courses: OrderedMap<FrequencyMap>,
    pub by_cohort: CohortBreakdown,
    pub prior_experience: Tally,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(pairs: &[(&str, usize)]) -> FrequencyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Count(*v)))
            .collect()
    }

    #[test]
    fn test_ordered_map_keeps_insertion_order_in_json() {
        let map = freq(&[("zeta", 3), ("alpha", 2), ("mid", 1)]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":3,"alpha":2,"mid":1}"#);
    }

    #[test]
    fn test_ordered_map_deserializes_in_document_order() {
        let map: FrequencyMap = serde_json::from_str(r#"{"b":5,"a":7,"c":1}"#).unwrap();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map.get("a"), Some(&Count(7)));
    }

    #[test]
    fn test_count_rejects_negative() {
        let parsed: Result<Count, _> = serde_json::from_str("-1");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_frequency_totals() {
        let map = freq(&[("a", 4), ("b", 1)]);
        assert_eq!(map.total(), 5);
        assert_eq!(map.max_count(), 4);
        assert_eq!(FrequencyMap::new().max_count(), 0);
    }

    #[test]
    fn test_row_percentages_sum_to_hundred() {
        let mut rows = OrderedMap::new();
        rows.push("1", freq(&[("Sí", 2), ("No", 1), ("Tal vez", 0)]));
        rows.push("2", freq(&[("Sí", 0), ("No", 4), ("Tal vez", 4)]));
        let tab = CrossTab { rows };

        for (_, row) in tab.row_percentages().iter() {
            let sum: f64 = row.values().sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
        let pct = tab.row_percentages();
        assert_eq!(pct.get("2").and_then(|r| r.get("No")), Some(&50.0));
    }

    #[test]
    fn test_cross_tab_serializes_as_plain_map() {
        let mut rows = OrderedMap::new();
        rows.push("3", freq(&[("Sí", 1)]));
        let json = serde_json::to_string(&CrossTab { rows }).unwrap();
        assert_eq!(json, r#"{"3":{"Sí":1}}"#);
    }
}
