//! In-memory price store
//!
//! A single `RwLock` guards the collection: mutations hold it exclusively,
//! which keeps id assignment and iteration consistent; reads share it and
//! hand back owned copies.

use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use market_core::validation::{validate_new, validate_patch};
use market_core::{
    normalize_label, NewObservation, ObservationId, ObservationKey, ObservationPatch,
    PriceFilter, PriceObservation, StoreConfig, StoreError, StoreResult,
};

/// Observation plus its grouping key, computed once on write
#[derive(Debug, Clone)]
pub(crate) struct StoredObservation {
    pub(crate) obs: PriceObservation,
    pub(crate) key: ObservationKey,
}

impl StoredObservation {
    fn new(obs: PriceObservation) -> Self {
        let key = obs.key();
        Self { obs, key }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Insertion order
    records: Vec<StoredObservation>,
    /// Last id handed out; ids start at 1 and are never reused
    last_id: u64,
}

impl StoreInner {
    fn position(&self, id: ObservationId) -> Option<usize> {
        self.records.iter().position(|r| r.obs.id == id)
    }
}

/// Process-lifetime collection of price observations
#[derive(Debug)]
pub struct PriceStore {
    inner: RwLock<StoreInner>,
    config: StoreConfig,

    /// Stats
    mutation_count: AtomicU64,
    last_mutation: RwLock<Option<Instant>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            config,
            mutation_count: AtomicU64::new(0),
            last_mutation: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Insert an observation under a fresh id
    pub fn insert(&self, new: NewObservation) -> StoreResult<PriceObservation> {
        if self.config.strict_validation {
            validate_new(&new)?;
        }

        let stored = {
            let mut inner = self.inner.write();
            inner.last_id += 1;
            let obs = new.with_id(ObservationId(inner.last_id));
            inner.records.push(StoredObservation::new(obs.clone()));
            obs
        };

        self.record_mutation();
        debug!(
            id = %stored.id,
            commodity = %stored.commodity_name,
            region = %stored.region,
            date = %stored.observed_date,
            price = %stored.price,
            "Inserted observation"
        );

        Ok(stored)
    }

    /// Apply `patch` to the observation with `id`
    pub fn update(&self, id: ObservationId, patch: &ObservationPatch) -> StoreResult<PriceObservation> {
        if self.config.strict_validation {
            validate_patch(patch)?;
        }

        let updated = {
            let mut inner = self.inner.write();
            let Some(pos) = inner.position(id) else {
                warn!(id = %id, "Update for unknown observation");
                return Err(StoreError::NotFound(id));
            };

            let record = &mut inner.records[pos];
            patch.apply_to(&mut record.obs);
            record.key = record.obs.key();
            record.obs.clone()
        };

        self.record_mutation();
        debug!(id = %id, "Updated observation");

        Ok(updated)
    }

    /// Remove the observation with `id`; returns whether anything was removed
    pub fn delete(&self, id: ObservationId) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            match inner.position(id) {
                Some(pos) => {
                    inner.records.remove(pos);
                    true
                }
                None => false,
            }
        };

        if removed {
            self.record_mutation();
            debug!(id = %id, "Deleted observation");
        } else {
            debug!(id = %id, "Delete for unknown observation, nothing removed");
        }

        removed
    }

    pub fn get(&self, id: ObservationId) -> Option<PriceObservation> {
        let inner = self.inner.read();
        inner.position(id).map(|pos| inner.records[pos].obs.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every observation, in insertion order
    pub fn get_all(&self) -> Vec<PriceObservation> {
        self.inner.read().records.iter().map(|r| r.obs.clone()).collect()
    }

    /// One observation per (commodity, region): the one with the latest date.
    ///
    /// When several share the latest date, the last one written wins.
    /// Result is ordered by normalized (commodity, region).
    pub fn latest_prices(&self) -> Vec<PriceObservation> {
        let inner = self.inner.read();
        let mut latest: HashMap<&ObservationKey, &PriceObservation> = HashMap::new();

        for record in &inner.records {
            let replace = latest
                .get(&record.key)
                .map_or(true, |held| held.observed_date <= record.obs.observed_date);
            if replace {
                latest.insert(&record.key, &record.obs);
            }
        }

        let ordered: BTreeMap<_, _> = latest.into_iter().collect();
        ordered.into_values().cloned().collect()
    }

    /// Latest prices narrowed by the search box / region selector
    pub fn search_latest(&self, filter: &PriceFilter) -> Vec<PriceObservation> {
        self.latest_prices()
            .into_iter()
            .filter(|obs| filter.matches(obs))
            .collect()
    }

    /// Series for one commodity in one region, ascending by date
    pub fn historical_prices(&self, commodity_name: &str, region: &str) -> Vec<PriceObservation> {
        let key = ObservationKey::new(commodity_name, region);
        let mut series: Vec<PriceObservation> = self
            .inner
            .read()
            .records
            .iter()
            .filter(|r| r.key == key)
            .map(|r| r.obs.clone())
            .collect();

        // Stable: same-day records keep insertion order
        series.sort_by_key(|obs| obs.observed_date);
        series
    }

    pub fn by_date(&self, date: NaiveDate) -> Vec<PriceObservation> {
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| r.obs.observed_date == date)
            .map(|r| r.obs.clone())
            .collect()
    }

    pub fn by_commodity(&self, commodity_name: &str) -> Vec<PriceObservation> {
        let commodity = normalize_label(commodity_name);
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| r.key.commodity == commodity)
            .map(|r| r.obs.clone())
            .collect()
    }

    /// Distinct commodity labels, sorted
    pub fn unique_commodity_names(&self) -> Vec<String> {
        self.with_records(commodity_labels)
    }

    /// Distinct region labels, sorted
    pub fn unique_regions(&self) -> Vec<String> {
        self.with_records(region_labels)
    }

    /// Run `f` over the raw records under the read lock
    pub(crate) fn with_records<R>(&self, f: impl FnOnce(&[StoredObservation]) -> R) -> R {
        let inner = self.inner.read();
        f(&inner.records)
    }

    fn record_mutation(&self) {
        self.mutation_count.fetch_add(1, Ordering::Relaxed);
        *self.last_mutation.write() = Some(Instant::now());
    }

    /// Stats; the counts come from one consistent read
    pub fn stats(&self) -> StoreStats {
        let (observation_count, commodity_count, region_count) = self.with_records(|records| {
            (
                records.len(),
                commodity_labels(records).len(),
                region_labels(records).len(),
            )
        });

        StoreStats {
            observation_count,
            commodity_count,
            region_count,
            mutation_count: self.mutation_count.load(Ordering::Relaxed),
            last_mutation_age: self.last_mutation.read().map(|at| at.elapsed()),
        }
    }
}

fn commodity_labels(records: &[StoredObservation]) -> Vec<String> {
    unique_labels(records, |r| (&r.key.commodity, &r.obs.commodity_name))
}

fn region_labels(records: &[StoredObservation]) -> Vec<String> {
    unique_labels(records, |r| (&r.key.region, &r.obs.region))
}

/// Labels deduplicated by normalized form; the first spelling seen is kept
fn unique_labels<F>(records: &[StoredObservation], pick: F) -> Vec<String>
where
    F: for<'a> Fn(&'a StoredObservation) -> (&'a String, &'a String),
{
    let mut seen: HashMap<&String, &String> = HashMap::new();
    for record in records {
        let (normalized, label) = pick(record);
        seen.entry(normalized).or_insert(label);
    }

    let mut labels: Vec<String> = seen.into_values().cloned().collect();
    labels.sort();
    labels
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the store
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub observation_count: usize,
    pub commodity_count: usize,
    pub region_count: usize,
    pub mutation_count: u64,
    pub last_mutation_age: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn obs(name: &str, region: &str, d: u32, price: i64) -> NewObservation {
        NewObservation::new(name, Decimal::from(price), region, day(d), "kg")
    }

    fn store_with(items: Vec<NewObservation>) -> PriceStore {
        let store = PriceStore::new();
        for item in items {
            store.insert(item).unwrap();
        }
        store
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = PriceStore::new();
        let a = store.insert(obs("Tomato", "Lahore", 1, 100)).unwrap();
        let b = store.insert(obs("Tomato", "Lahore", 2, 110)).unwrap();

        assert_eq!(a.id, ObservationId(1));
        assert_eq!(b.id, ObservationId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = PriceStore::new();
        let a = store.insert(obs("Tomato", "Lahore", 1, 100)).unwrap();
        assert!(store.delete(a.id));

        let b = store.insert(obs("Tomato", "Lahore", 1, 100)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_get_all_is_insertion_order_copy() {
        let store = store_with(vec![
            obs("Onion", "Quetta", 3, 70),
            obs("Carrot", "Karachi", 1, 90),
        ]);

        let mut all = store.get_all();
        assert_eq!(all[0].commodity_name, "Onion");
        assert_eq!(all[1].commodity_name, "Carrot");

        all.clear();
        assert_eq!(store.len(), 2, "Caller's copy must not alias the store");
    }

    #[test]
    fn test_update_missing_id() {
        let store = store_with(vec![obs("Onion", "Quetta", 3, 70)]);
        let before = store.get_all();

        let err = store
            .update(ObservationId(99), &ObservationPatch::default().price(Decimal::ONE))
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(ObservationId(99)));
        assert_eq!(store.get_all(), before);
        assert_eq!(store.stats().mutation_count, 1);
    }

    #[test]
    fn test_update_changes_only_supplied_fields() {
        let store = store_with(vec![obs("Onion", "Quetta", 3, 70)]);
        let id = store.get_all()[0].id;

        let updated = store
            .update(id, &ObservationPatch::default().price(Decimal::from(75)))
            .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.price, Decimal::from(75));
        assert_eq!(updated.commodity_name, "Onion");
        assert_eq!(updated.region, "Quetta");
        assert_eq!(updated.observed_date, day(3));
        assert_eq!(store.get(id), Some(updated));
    }

    #[test]
    fn test_update_rekeys_record() {
        let store = store_with(vec![obs("Onion", "Quetta", 3, 70)]);
        let id = store.get_all()[0].id;

        store
            .update(id, &ObservationPatch::default().region("Lahore"))
            .unwrap();

        assert!(store.historical_prices("onion", "quetta").is_empty());
        assert_eq!(store.historical_prices("onion", "lahore").len(), 1);
    }

    #[test]
    fn test_strict_store_rejects_bad_writes() {
        let store = PriceStore::new();
        let err = store.insert(obs("Onion", "Quetta", 3, -5)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty());

        let id = store.insert(obs("Onion", "Quetta", 3, 5)).unwrap().id;
        let err = store
            .update(id, &ObservationPatch::default().commodity_name(" "))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get(id).unwrap().commodity_name, "Onion");
    }

    #[test]
    fn test_permissive_store_accepts_unvalidated_input() {
        let store = PriceStore::with_config(StoreConfig {
            strict_validation: false,
        });
        assert!(store.insert(obs("", "Quetta", 3, -5)).is_ok());
    }

    #[test]
    fn test_delete() {
        let store = store_with(vec![
            obs("Onion", "Quetta", 3, 70),
            obs("Carrot", "Karachi", 1, 90),
        ]);
        let id = store.get_all()[0].id;

        assert!(!store.delete(ObservationId(42)));
        assert_eq!(store.len(), 2);

        assert!(store.delete(id));
        assert_eq!(store.len(), 1);
        assert!(store.get_all().iter().all(|o| o.id != id));
        assert!(!store.delete(id), "Second delete is a no-op");
    }

    #[test]
    fn test_latest_prices_one_per_key() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 1, 100),
            obs("Tomato", "Lahore", 3, 130),
            obs("tomato", "LAHORE", 2, 120),
            obs("Tomato", "Karachi", 2, 90),
        ]);

        let latest = store.latest_prices();
        assert_eq!(latest.len(), 2);

        let lahore = latest.iter().find(|o| o.region == "Lahore").unwrap();
        assert_eq!(lahore.price, Decimal::from(130));
        assert_eq!(lahore.observed_date, day(3));
    }

    #[test]
    fn test_latest_tie_last_write_wins() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 3, 100),
            obs("Tomato", "Lahore", 3, 105),
            obs("Tomato", "Lahore", 2, 999),
        ]);

        let latest = store.latest_prices();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].price, Decimal::from(105));
    }

    #[test]
    fn test_historical_prices_sorted_and_case_insensitive() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 5, 150),
            obs("Potato", "Lahore", 4, 60),
            obs("TOMATO", "lahore", 2, 120),
            obs("Tomato", "Karachi", 1, 90),
        ]);

        let series = store.historical_prices("tomato", "Lahore");
        let dates: Vec<_> = series.iter().map(|o| o.observed_date).collect();
        assert_eq!(dates, vec![day(2), day(5)]);

        assert!(store.historical_prices("Garlic", "Lahore").is_empty());
    }

    #[test]
    fn test_unique_labels() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 1, 100),
            obs("Onion", "Karachi", 1, 100),
            obs("tomato", "lahore", 2, 100),
        ]);

        assert_eq!(store.unique_commodity_names(), vec!["Onion", "Tomato"]);
        assert_eq!(store.unique_regions(), vec!["Karachi", "Lahore"]);
    }

    #[test]
    fn test_by_date_and_by_commodity() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 1, 100),
            obs("Onion", "Karachi", 1, 100),
            obs("tomato", "Quetta", 2, 100),
        ]);

        assert_eq!(store.by_date(day(1)).len(), 2);
        assert!(store.by_date(day(9)).is_empty());
        assert_eq!(store.by_commodity("TOMATO").len(), 2);
    }

    #[test]
    fn test_search_latest() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 1, 100),
            obs("Tomato", "Lahore", 2, 110),
            obs("Onion", "Karachi", 1, 100),
        ]);

        let hits = store.search_latest(&PriceFilter::default().search("tom"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].price, Decimal::from(110));

        let hits = store.search_latest(&PriceFilter::default().region("karachi"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].commodity_name, "Onion");
    }

    #[test]
    fn test_stats() {
        let store = PriceStore::new();
        assert!(store.stats().last_mutation_age.is_none());

        store.insert(obs("Tomato", "Lahore", 1, 100)).unwrap();
        store.insert(obs("Onion", "Lahore", 1, 100)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.observation_count, 2);
        assert_eq!(stats.commodity_count, 2);
        assert_eq!(stats.region_count, 1);
        assert_eq!(stats.mutation_count, 2);
        assert!(stats.last_mutation_age.is_some());
    }

    #[test]
    fn test_concurrent_inserts_keep_ids_unique() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(PriceStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..100 {
                        store.insert(obs("Tomato", "Lahore", 1 + (j % 28), i * 100 + j as i64)).unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let ids: HashSet<_> = store.get_all().iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(store.stats().mutation_count, 400);
    }

    #[test]
    fn test_stats_counts_come_from_one_snapshot() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(PriceStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                // Every insert adds one observation, one commodity and one region
                for i in 0..500 {
                    let name = format!("Commodity {}", i);
                    let region = format!("Region {}", i);
                    store.insert(obs(&name, &region, 1, 100)).unwrap();
                }
                done.store(true, Ordering::Release);
            })
        };

        while !done.load(Ordering::Acquire) {
            let stats = store.stats();
            assert_eq!(stats.observation_count, stats.commodity_count);
            assert_eq!(stats.observation_count, stats.region_count);
        }
        writer.join().unwrap();

        let stats = store.stats();
        assert_eq!(stats.observation_count, 500);
        assert_eq!(stats.region_count, 500);
    }

    #[test]
    fn test_lookups_ignore_case_and_surrounding_whitespace() {
        let store = store_with(vec![
            obs("Tomato", "Lahore", 1, 100),
            obs("Tomato ", " lahore", 2, 110),
        ]);

        assert_eq!(store.historical_prices(" tomato", "LAHORE").len(), 2);
        assert_eq!(store.latest_prices().len(), 1);
        assert_eq!(store.unique_commodity_names(), vec!["Tomato"]);
    }

    fn arb_observation() -> impl Strategy<Value = NewObservation> {
        (
            prop::sample::select(vec!["Tomato", "tomato", "Onion", "Carrot"]),
            prop::sample::select(vec!["Lahore", "LAHORE", "Quetta"]),
            1u32..=28,
            0i64..500,
        )
            .prop_map(|(name, region, d, price)| obs(name, region, d, price))
    }

    proptest! {
        #[test]
        fn prop_insert_ids_unique(items in prop::collection::vec(arb_observation(), 0..60)) {
            let store = PriceStore::new();
            let mut ids = HashSet::new();
            for item in items {
                let stored = store.insert(item).unwrap();
                prop_assert!(ids.insert(stored.id));
            }
        }

        #[test]
        fn prop_latest_is_max_date_per_key(items in prop::collection::vec(arb_observation(), 0..60)) {
            let store = store_with(items);
            let all = store.get_all();
            let latest = store.latest_prices();

            let keys: HashSet<_> = latest.iter().map(|o| o.key()).collect();
            prop_assert_eq!(keys.len(), latest.len());

            let all_keys: HashSet<_> = all.iter().map(|o| o.key()).collect();
            prop_assert_eq!(all_keys.len(), latest.len());

            for entry in &latest {
                let max_date = all
                    .iter()
                    .filter(|o| o.key() == entry.key())
                    .map(|o| o.observed_date)
                    .max()
                    .unwrap();
                prop_assert_eq!(entry.observed_date, max_date);
            }
        }

        #[test]
        fn prop_historical_sorted_and_matching(
            items in prop::collection::vec(arb_observation(), 0..60),
            name in prop::sample::select(vec!["TOMATO", "onion", "Garlic"]),
            region in prop::sample::select(vec!["lahore", "Quetta"]),
        ) {
            let store = store_with(items);
            let series = store.historical_prices(name, region);

            for pair in series.windows(2) {
                prop_assert!(pair[0].observed_date <= pair[1].observed_date);
            }
            for entry in &series {
                prop_assert!(entry.commodity_name.eq_ignore_ascii_case(name));
                prop_assert!(entry.region.eq_ignore_ascii_case(region));
            }
        }
    }
}
