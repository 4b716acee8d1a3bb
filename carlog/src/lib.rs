//! Core of the car expense ledger: trip records, the list view reducer,
//! persistence to a key-value store and spreadsheet exchange.

pub mod app;
pub mod clock;
pub mod codec;
pub mod debounce;
pub mod error;
pub mod exchange;
pub mod persistence;
pub mod record;
pub mod sample_data;
pub mod store;
pub mod view;

pub use app::{App, AppSettings, ExchangeKind, ExchangeTicket, Hydrated};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CsvCodec, SheetCodec};
pub use error::{
    AppError, CodecError, Field, ImportRowError, PersistenceError, StorageError, ValidationError,
};
pub use exchange::{export_rows, import_rows, ImportReport, TabularRow};
pub use persistence::{Loaded, PersistenceAdapter, StoredLedger};
pub use record::{NewTrip, Record, RecordFactory, RecordId, TollRate, TollSchedule};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::{reduce, SortDirective, ViewPage, ViewQuery};
