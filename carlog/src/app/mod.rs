use std::collections::HashSet;

use time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::debounce::Debouncer;
use crate::error::{AppError, Field, PersistenceError, ValidationError};
use crate::persistence::{Loaded, PersistenceAdapter};
use crate::record::{sum_totals, NewTrip, Record, RecordFactory, RecordId};
use crate::sample_data::sample_records;
use crate::store::KeyValueStore;
use crate::view::{SortDirective, DEFAULT_PAGE_SIZE};

mod exchange;
mod navigation;
mod persist;

pub use exchange::{ExchangeKind, ExchangeTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub page_size: usize,
    pub persist_debounce: Duration,
    pub search_debounce: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            persist_debounce: Duration::milliseconds(1000),
            search_debounce: Duration::milliseconds(300),
        }
    }
}

/// How the collection was populated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydrated {
    Loaded(usize),
    Seeded(usize),
    Empty,
}

/// Owns the ledger and the list view inputs.
///
/// Every mutation is visible to the next [`App::view`] call right away;
/// writes to storage are debounced and happen from [`App::poll`],
/// [`App::flush`] or [`App::shutdown`].
pub struct App<S: KeyValueStore, C: Clock> {
    records: Vec<Record>,
    total_cost: u64,
    factory: RecordFactory<C>,
    persistence: PersistenceAdapter<S>,

    // View inputs
    search: String,
    pending_search: Option<String>,
    sort: SortDirective,
    current_page: usize,
    page_size: usize,

    persist_debounce: Debouncer,
    search_debounce: Debouncer,
    dirty: bool,
    last_saved: Option<i64>,

    exchanges_in_flight: HashSet<ExchangeKind>,

    /// Field-scoped message from the last rejected add.
    validation: Option<ValidationError>,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(store: S, clock: C, settings: AppSettings) -> Self {
        Self {
            records: Vec::new(),
            total_cost: 0,
            factory: RecordFactory::new(clock),
            persistence: PersistenceAdapter::new(store),
            search: String::new(),
            pending_search: None,
            sort: SortDirective::None,
            current_page: 1,
            page_size: settings.page_size.max(1),
            persist_debounce: Debouncer::new(settings.persist_debounce),
            search_debounce: Debouncer::new(settings.search_debounce),
            dirty: false,
            last_saved: None,
            exchanges_in_flight: HashSet::new(),
            validation: None,
        }
    }

    /// Load the ledger from storage, seeding sample trips when there is
    /// nothing usable and `seed_samples` is set.
    pub fn hydrate(&mut self, seed_samples: bool) -> Result<Hydrated, PersistenceError> {
        match self.persistence.load()? {
            Loaded::Ledger {
                records,
                total_cost,
                last_saved,
            } => {
                let count = records.len();
                self.records = records;
                self.total_cost = total_cost;
                self.last_saved = last_saved;
                self.dedupe_ids();
                for record in &self.records {
                    self.factory.observe(record);
                }
                Ok(Hydrated::Loaded(count))
            }
            Loaded::Empty if seed_samples => {
                self.records = sample_records(&mut self.factory);
                self.total_cost = sum_totals(&self.records);
                info!(records = self.records.len(), "Seeded sample trips");
                self.mark_mutated();
                Ok(Hydrated::Seeded(self.records.len()))
            }
            Loaded::Empty => Ok(Hydrated::Empty),
        }
    }

    fn dedupe_ids(&mut self) {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (idx, record) in self.records.iter().enumerate() {
            if !seen.insert(record.id()) {
                duplicates.push(idx);
            }
        }
        if duplicates.is_empty() {
            return;
        }

        warn!(count = duplicates.len(), "Reassigning duplicate record ids");
        for record in &self.records {
            self.factory.observe(record);
        }
        for idx in duplicates {
            let id = self.factory.next_id();
            self.records[idx] = self.records[idx].with_id(id);
        }
        self.dirty = true;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    pub fn clock(&self) -> &C {
        self.factory.clock()
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        self.validation.as_ref()
    }

    /// Editing a field clears its validation message.
    pub fn field_edited(&mut self, field: Field) {
        if self.validation.as_ref().map(ValidationError::field) == Some(field) {
            self.validation = None;
        }
    }

    pub fn add(&mut self, trip: NewTrip) -> Result<&Record, ValidationError> {
        let record = match self.factory.create(trip) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Rejected trip");
                self.validation = Some(e.clone());
                return Err(e);
            }
        };

        self.validation = None;
        self.total_cost = self.total_cost.saturating_add(record.total());
        info!(id = %record.id(), route = record.route(), total = record.total(), "Trip added");
        self.records.insert(0, record);
        self.mark_mutated();
        Ok(&self.records[0])
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Record, AppError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(AppError::RecordNotFound(id))?;

        let record = self.records.remove(idx);
        self.total_cost = self.total_cost.saturating_sub(record.total());
        info!(id = %id, "Trip removed");
        self.mark_mutated();
        Ok(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.total_cost = 0;
        info!("Ledger cleared");
        self.mark_mutated();
    }

    /// Shared tail of every collection mutation.
    fn mark_mutated(&mut self) {
        self.current_page = 1;
        self.dirty = true;
        let now = self.factory.clock().now();
        self.persist_debounce.trigger(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::STORAGE_KEY;
    use crate::store::MemoryStore;
    use time::macros::datetime;

    pub(super) fn test_app() -> (App<MemoryStore, ManualClock>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(datetime!(2024-03-01 09:00 +9));
        let app = App::new(store.clone(), clock.clone(), AppSettings::default());
        (app, store, clock)
    }

    #[test]
    fn add_prepends_and_updates_total() {
        let (mut app, _, _) = test_app();
        app.add(NewTrip::new("서울", "부산", 1_000, 2_000)).unwrap();
        let added = app.add(NewTrip::new("부산", "울산", 500, 700)).unwrap();
        assert_eq!(added.total(), 1_200);

        assert_eq!(app.len(), 2);
        assert_eq!(app.total_cost(), 4_200);
        assert_eq!(app.records()[0].route(), "부산 → 울산");
    }

    #[test]
    fn rejected_add_leaves_state_untouched() {
        let (mut app, _, _) = test_app();
        app.add(NewTrip::new("서울", "부산", 1, 1)).unwrap();

        let err = app.add(NewTrip::new("서울", " ", 5, 5)).unwrap_err();
        assert_eq!(err.field(), Field::Destination);
        assert_eq!(app.len(), 1);
        assert_eq!(app.total_cost(), 2);
        assert_eq!(app.validation(), Some(&err));

        app.field_edited(Field::Origin);
        assert!(app.validation().is_some());
        app.field_edited(Field::Destination);
        assert!(app.validation().is_none());
    }

    #[test]
    fn successful_add_clears_validation() {
        let (mut app, _, _) = test_app();
        let _ = app.add(NewTrip::new("", "부산", 0, 0));
        assert!(app.validation().is_some());
        app.add(NewTrip::new("서울", "부산", 0, 0)).unwrap();
        assert!(app.validation().is_none());
    }

    #[test]
    fn remove_subtracts_total() {
        let (mut app, _, _) = test_app();
        let id = app.add(NewTrip::new("서울", "부산", 100, 200)).unwrap().id();
        app.add(NewTrip::new("A", "B", 1, 2)).unwrap();

        let removed = app.remove(id).unwrap();
        assert_eq!(removed.total(), 300);
        assert_eq!(app.total_cost(), 3);
        assert!(matches!(app.remove(id), Err(AppError::RecordNotFound(_))));
    }

    #[test]
    fn hydrate_seeds_samples_on_first_run() {
        let (mut app, store, _) = test_app();
        let outcome = app.hydrate(true).unwrap();

        assert!(matches!(outcome, Hydrated::Seeded(n) if n > 0));
        assert_eq!(
            app.total_cost(),
            app.records().iter().map(Record::total).sum::<u64>()
        );
        app.shutdown().unwrap();
        assert!(store.raw(STORAGE_KEY).is_some());
    }

    #[test]
    fn hydrate_treats_corrupt_storage_as_empty() {
        let (mut app, mut store, _) = test_app();
        store.set(STORAGE_KEY, "][").unwrap();

        assert_eq!(app.hydrate(false).unwrap(), Hydrated::Empty);
        assert!(app.is_empty());
        assert_eq!(app.total_cost(), 0);
    }

    #[test]
    fn hydrate_reloads_saved_ledger() {
        let (mut app, store, clock) = test_app();
        app.add(NewTrip::new("서울", "부산", 100, 200)).unwrap();
        app.shutdown().unwrap();

        let mut reloaded = App::new(store, clock, AppSettings::default());
        assert_eq!(reloaded.hydrate(true).unwrap(), Hydrated::Loaded(1));
        assert_eq!(reloaded.total_cost(), 300);

        let next = reloaded.add(NewTrip::new("A", "B", 0, 0)).unwrap().id();
        assert!(next > app.records()[0].id());
    }

    #[test]
    fn hydrate_reassigns_duplicate_ids() {
        let (mut app, mut store, _) = test_app();
        let raw = r#"{"records": [
            {"id": 7, "date": "2024. 1. 1.", "origin": "A", "destination": "B", "tollFee": 1, "fuelCost": 0, "timestamp": 1},
            {"id": 7, "date": "2024. 1. 1.", "origin": "C", "destination": "D", "tollFee": 2, "fuelCost": 0, "timestamp": 2}
        ], "totalCost": 3, "version": "1.0"}"#;
        store.set(STORAGE_KEY, raw).unwrap();

        app.hydrate(false).unwrap();
        assert_ne!(app.records()[0].id(), app.records()[1].id());
        assert_eq!(app.records()[0].id(), RecordId(7));
    }
}
