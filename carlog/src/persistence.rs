use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::clock::epoch_millis;
use crate::error::PersistenceError;
use crate::record::{sum_totals, Record, RecordId};
use crate::store::KeyValueStore;

pub const STORAGE_KEY: &str = "car_expense_data";
pub const LEDGER_VERSION: &str = "1.0";
const SUPPORTED_MAJOR: &str = "1";

/// A record as written to storage. Route and total are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: RecordId,
    pub date: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub toll_fee: u64,
    #[serde(default)]
    pub fuel_cost: u64,
    #[serde(default)]
    pub total_cost: u64,
    pub timestamp: i64,
}

impl From<&Record> for StoredRecord {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id(),
            date: record.date().to_string(),
            origin: record.origin().to_string(),
            destination: record.destination().to_string(),
            route: record.route().to_string(),
            toll_fee: record.toll_fee(),
            fuel_cost: record.fuel_cost(),
            total_cost: record.total(),
            timestamp: record.timestamp(),
        }
    }
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        Record::from_parts(
            stored.id,
            stored.date,
            stored.origin,
            stored.destination,
            stored.toll_fee,
            stored.fuel_cost,
            stored.timestamp,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLedger {
    pub records: Vec<StoredRecord>,
    #[serde(default)]
    pub total_cost: u64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub last_saved: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded {
    /// Nothing usable in storage: first run or an unreadable payload.
    Empty,
    Ledger {
        records: Vec<Record>,
        total_cost: u64,
        last_saved: Option<i64>,
    },
}

/// Saves and loads the ledger under a fixed key of a [`KeyValueStore`].
#[derive(Debug)]
pub struct PersistenceAdapter<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(
        &mut self,
        records: &[Record],
        total_cost: u64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        let ledger = StoredLedger {
            records: records.iter().map(StoredRecord::from).collect(),
            total_cost,
            version: Some(LEDGER_VERSION.to_string()),
            last_saved: Some(epoch_millis(now)),
        };
        let raw = serde_json::to_string(&ledger)?;
        self.store.set(STORAGE_KEY, &raw)?;
        info!(records = records.len(), total_cost, "Ledger saved");
        Ok(())
    }

    /// Corrupt or malformed payloads load as [`Loaded::Empty`]. A payload
    /// from an unknown major version is an error so it is never overwritten.
    pub fn load(&self) -> Result<Loaded, PersistenceError> {
        let Some(raw) = self.store.get(STORAGE_KEY)? else {
            return Ok(Loaded::Empty);
        };

        let probe: VersionProbe = match serde_json::from_str(&raw) {
            Ok(probe) => probe,
            Err(e) => {
                warn!(error = %e, "Stored ledger is not valid JSON, starting empty");
                return Ok(Loaded::Empty);
            }
        };
        check_version(probe.version.as_deref())?;

        let stored: StoredLedger = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Stored ledger has an unexpected shape, starting empty");
                return Ok(Loaded::Empty);
            }
        };

        let records: Vec<Record> = stored.records.into_iter().map(Record::from).collect();
        let total_cost = sum_totals(&records);
        if total_cost != stored.total_cost {
            warn!(
                stored = stored.total_cost,
                recomputed = total_cost,
                "Stored total disagrees with records, using recomputed total"
            );
        }

        info!(records = records.len(), total_cost, "Ledger loaded");
        Ok(Loaded::Ledger {
            records,
            total_cost,
            last_saved: stored.last_saved,
        })
    }
}

fn check_version(version: Option<&str>) -> Result<(), PersistenceError> {
    match version {
        None => Ok(()),
        Some(v) if v.split('.').next() == Some(SUPPORTED_MAJOR) => Ok(()),
        Some(v) => Err(PersistenceError::UnsupportedVersion(v.to_string())),
    }
}
