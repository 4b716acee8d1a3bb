use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

use crate::clock::{epoch_millis, Clock};
use crate::error::{Field, ValidationError};

pub const ROUTE_SEPARATOR: &str = " → ";

/// Largest toll or fuel amount a record holds (1,000조 원). Larger inputs are
/// clamped, so `toll + fuel` always fits and sums over many records stay far
/// from `u64::MAX`.
pub const MAX_AMOUNT: u64 = 1_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One trip entry. Route and total are derived from the other fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: RecordId,
    date: String,
    origin: String,
    destination: String,
    route: String,
    toll_fee: u64,
    fuel_cost: u64,
    timestamp: i64,
}

impl Record {
    pub(crate) fn from_parts(
        id: RecordId,
        date: String,
        origin: String,
        destination: String,
        toll_fee: u64,
        fuel_cost: u64,
        timestamp: i64,
    ) -> Self {
        let route = route_label(&origin, &destination);
        Self {
            id,
            date,
            origin,
            destination,
            route,
            toll_fee: toll_fee.min(MAX_AMOUNT),
            fuel_cost: fuel_cost.min(MAX_AMOUNT),
            timestamp,
        }
    }

    pub(crate) fn with_id(&self, id: RecordId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Display date, e.g. "2024. 3. 1."
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn toll_fee(&self) -> u64 {
        self.toll_fee
    }

    pub fn fuel_cost(&self) -> u64 {
        self.fuel_cost
    }

    pub fn total(&self) -> u64 {
        self.toll_fee + self.fuel_cost
    }

    /// Creation time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Sum of record totals. Saturates instead of overflowing.
pub fn sum_totals<'a>(records: impl IntoIterator<Item = &'a Record>) -> u64 {
    records
        .into_iter()
        .fold(0u64, |acc, record| acc.saturating_add(record.total()))
}

pub fn route_label(origin: &str, destination: &str) -> String {
    format!("{origin}{ROUTE_SEPARATOR}{destination}")
}

/// Korean locale date, matching `toLocaleDateString('ko-KR')`.
pub fn korean_date(date: Date) -> String {
    format!("{}. {}. {}.", date.year(), date.month() as u8, date.day())
}

/// Input of the trip form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTrip {
    pub origin: String,
    pub destination: String,
    pub toll_fee: u64,
    pub fuel_cost: u64,
}

impl NewTrip {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        toll_fee: u64,
        fuel_cost: u64,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            toll_fee,
            fuel_cost,
        }
    }
}

/// Builds records with fresh identifiers and strictly increasing timestamps.
#[derive(Debug)]
pub struct RecordFactory<C: Clock> {
    clock: C,
    last_id: u64,
    last_timestamp: i64,
}

impl<C: Clock> RecordFactory<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_id: 0,
            last_timestamp: i64::MIN,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Make sure generated ids and timestamps stay ahead of an existing record.
    pub fn observe(&mut self, record: &Record) {
        self.last_id = self.last_id.max(record.id.0);
        self.last_timestamp = self.last_timestamp.max(record.timestamp);
    }

    pub fn create(&mut self, trip: NewTrip) -> Result<Record, ValidationError> {
        let origin = trip.origin.trim();
        if origin.is_empty() {
            return Err(ValidationError::EmptyField(Field::Origin));
        }
        let destination = trip.destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::EmptyField(Field::Destination));
        }

        let id = self.next_id();
        let timestamp = self.reserve_timestamps(1);
        Ok(Record::from_parts(
            id,
            self.today(),
            origin.to_string(),
            destination.to_string(),
            trip.toll_fee,
            trip.fuel_cost,
            timestamp,
        ))
    }

    /// Reserve `count` consecutive timestamps and return the first one.
    pub(crate) fn reserve_timestamps(&mut self, count: usize) -> i64 {
        let now = epoch_millis(self.clock.now());
        let start = now.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp = start.saturating_add(count.saturating_sub(1) as i64);
        start
    }

    pub(crate) fn next_id(&mut self) -> RecordId {
        let now = epoch_millis(self.clock.now()).max(0) as u64;
        self.last_id = now.max(self.last_id.saturating_add(1));
        RecordId(self.last_id)
    }

    pub(crate) fn today(&self) -> String {
        korean_date(self.clock.now().date())
    }
}

/// A configured toll between two places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TollRate {
    pub origin: String,
    pub destination: String,
    pub fee: u64,
}

/// Toll lookup for the read-only toll field. Routes are symmetric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TollSchedule {
    rates: Vec<TollRate>,
}

impl TollSchedule {
    pub fn new(rates: Vec<TollRate>) -> Self {
        Self { rates }
    }

    pub fn lookup(&self, origin: &str, destination: &str) -> u64 {
        let (origin, destination) = (origin.trim(), destination.trim());
        self.rates
            .iter()
            .find(|rate| {
                (rate.origin == origin && rate.destination == destination)
                    || (rate.origin == destination && rate.destination == origin)
            })
            .map(|rate| rate.fee)
            .unwrap_or(0)
    }
}
