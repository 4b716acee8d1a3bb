use anyhow::{Context, Result};
use carlog::{App, Clock, FileStore, Hydrated, KeyValueStore, SystemClock, TollSchedule};
use tracing::info;

use crate::config::CarlogConfig;

/// The controller plus the bits of config the commands need at runtime.
pub struct Session<S: KeyValueStore, C: Clock> {
    pub app: App<S, C>,
    pub tolls: TollSchedule,
}

pub type LedgerSession = Session<FileStore, SystemClock>;

pub fn open_ledger(config: &CarlogConfig) -> Result<LedgerSession> {
    let data_dir = config.data_dir()?;
    info!(data_dir = %data_dir.display(), "Opening ledger");
    open_with(FileStore::new(data_dir), SystemClock, config)
}

pub fn open_with<S: KeyValueStore, C: Clock>(
    store: S,
    clock: C,
    config: &CarlogConfig,
) -> Result<Session<S, C>> {
    let mut app = App::new(store, clock, config.app_settings());

    match app
        .hydrate(config.seed_sample_data)
        .context("Failed to load ledger")?
    {
        Hydrated::Loaded(count) => info!(records = count, "Ledger restored"),
        Hydrated::Seeded(count) => info!(records = count, "Started with sample trips"),
        Hydrated::Empty => info!("Started with an empty ledger"),
    }

    Ok(Session {
        app,
        tolls: config.toll_schedule(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use carlog::{ManualClock, MemoryStore};
    use time::macros::datetime;

    fn clock() -> ManualClock {
        ManualClock::new(datetime!(2024-03-01 09:00 +9))
    }

    #[test]
    fn seeds_when_configured() {
        let session = open_with(MemoryStore::new(), clock(), &CarlogConfig::default()).unwrap();
        assert!(!session.app.is_empty());
    }

    #[test]
    fn stays_empty_without_seeding() {
        let config = CarlogConfig {
            seed_sample_data: false,
            ..CarlogConfig::default()
        };
        let session = open_with(MemoryStore::new(), clock(), &config).unwrap();
        assert!(session.app.is_empty());
    }

    #[test]
    fn refuses_newer_ledger_versions() {
        let mut store = MemoryStore::new();
        store
            .set(
                "car_expense_data",
                r#"{"records": [], "totalCost": 0, "version": "2.0"}"#,
            )
            .unwrap();

        let err = open_with(store, clock(), &CarlogConfig::default())
            .err()
            .expect("newer version should be refused");
        assert!(format!("{err:#}").contains("unsupported ledger version"));
    }
}
