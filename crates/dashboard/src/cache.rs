//! Id-keyed stores for the last-fetched sensor and valve collections.
//! A refresh replaces the whole cache; nothing is ever merged in place.

use std::collections::HashMap;

use watering_client::{Sensor, Valve};

/// Anything cacheable by numeric id.
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Sensor {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Valve {
    fn key(&self) -> i64 {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

pub struct EntityCache<T> {
    entries: HashMap<i64, T>,
    /// False until the first successful ingest. Distinguishes "no data has
    /// arrived yet" from "data arrived and this id is not in it".
    populated: bool,
}

/// Outcome of looking a reference up, as the UI needs to see it.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, T> {
    /// The cache has never been populated; a fetch may still be in flight.
    Loading,
    /// The cache is populated but holds nothing for this reference (the id
    /// is unknown to the backend, or the bed references no entity at all).
    Missing,
    Found(&'a T),
}

impl<T: Keyed> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            populated: false,
        }
    }

    /// Replace the entire cache with `records` in one assignment. Duplicate
    /// ids in the input collapse to the last record seen.
    pub fn ingest(&mut self, records: Vec<T>) {
        self.entries = records.into_iter().map(|r| (r.key(), r)).collect();
        self.populated = true;
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Tri-state lookup for a bed's (nullable) reference field.
    pub fn resolve(&self, id: Option<i64>) -> Resolution<'_, T> {
        match id {
            // A null reference can never resolve, populated or not.
            None if self.populated => Resolution::Missing,
            None => Resolution::Loading,
            Some(id) => {
                if !self.populated {
                    Resolution::Loading
                } else {
                    match self.entries.get(&id) {
                        Some(record) => Resolution::Found(record),
                        None => Resolution::Missing,
                    }
                }
            }
        }
    }
}

impl<T: Keyed> Default for EntityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: i64, name: &str) -> Sensor {
        Sensor {
            id,
            name: name.into(),
            address: "0x44".into(),
            bus: 1,
        }
    }

    // -- ingest -------------------------------------------------------------

    #[test]
    fn ingest_replaces_wholesale() {
        let mut cache = EntityCache::new();
        cache.ingest(vec![sensor(1, "a"), sensor(2, "b")]);
        assert_eq!(cache.len(), 2);

        // A refresh that no longer contains id 1 must drop it entirely.
        cache.ingest(vec![sensor(2, "b2"), sensor(3, "c")]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_none());
        assert_eq!(cache.get(2).unwrap().name, "b2");
        assert_eq!(cache.get(3).unwrap().name, "c");
    }

    #[test]
    fn ingest_duplicate_ids_last_wins() {
        let mut cache = EntityCache::new();
        cache.ingest(vec![sensor(1, "first"), sensor(1, "second")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().name, "second");
    }

    #[test]
    fn ingest_twice_with_same_data_is_idempotent() {
        let records = || vec![sensor(1, "a"), sensor(2, "b")];
        let mut cache = EntityCache::new();
        cache.ingest(records());
        cache.ingest(records());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1).unwrap().name, "a");
    }

    #[test]
    fn ingest_empty_list_still_populates() {
        let mut cache: EntityCache<Sensor> = EntityCache::new();
        cache.ingest(vec![]);
        assert!(cache.is_populated());
        assert_eq!(cache.len(), 0);
    }

    // -- lookup -------------------------------------------------------------

    #[test]
    fn get_absent_is_none_not_default() {
        let mut cache = EntityCache::new();
        cache.ingest(vec![sensor(1, "a")]);
        assert!(cache.get(99).is_none());
    }

    // -- resolve tri-state --------------------------------------------------

    #[test]
    fn resolve_before_population_is_loading() {
        let cache: EntityCache<Sensor> = EntityCache::new();
        assert_eq!(cache.resolve(Some(1)), Resolution::Loading);
        assert_eq!(cache.resolve(None), Resolution::Loading);
    }

    #[test]
    fn resolve_after_population() {
        let mut cache = EntityCache::new();
        cache.ingest(vec![sensor(5, "Soil-5")]);

        match cache.resolve(Some(5)) {
            Resolution::Found(s) => assert_eq!(s.name, "Soil-5"),
            other => panic!("expected Found, got {other:?}"),
        }
        assert_eq!(cache.resolve(Some(99)), Resolution::Missing);
        assert_eq!(cache.resolve(None), Resolution::Missing);
    }
}
