use anyhow::{Context, Result};
use carlog::{
    App, Clock, CsvCodec, ExchangeKind, ImportReport, ImportRowError, KeyValueStore, SheetCodec,
    TabularRow,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write every record to a CSV file. Returns how many rows were written.
pub async fn export_to<S: KeyValueStore, C: Clock>(
    app: &mut App<S, C>,
    path: &Path,
) -> Result<usize> {
    let ticket = app.begin_exchange(ExchangeKind::Export)?;
    let rows = app.export_snapshot();
    let count = rows.len();

    match write_sheet(rows, path.to_path_buf()).await {
        Ok(()) => {
            info!(path = %path.display(), rows = count, "Wrote CSV");
            app.finish_export(ticket);
            Ok(count)
        }
        Err(e) => {
            app.abort_exchange(ticket);
            Err(e)
        }
    }
}

/// Append the rows of a CSV file to the ledger.
pub async fn import_from<S: KeyValueStore, C: Clock>(
    app: &mut App<S, C>,
    path: &Path,
) -> Result<ImportReport> {
    let ticket = app.begin_exchange(ExchangeKind::Import)?;

    match read_sheet(path.to_path_buf()).await {
        Ok(rows) => Ok(app.finish_import(ticket, rows)),
        Err(e) => {
            app.abort_exchange(ticket);
            Err(e)
        }
    }
}

async fn write_sheet(rows: Vec<TabularRow>, path: PathBuf) -> Result<()> {
    let bytes = tokio::task::spawn_blocking(move || CsvCodec.encode(&rows))
        .await
        .context("CSV encoder task failed")?
        .context("Failed to encode CSV")?;

    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn read_sheet(path: PathBuf) -> Result<Vec<Result<TabularRow, ImportRowError>>> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let rows = tokio::task::spawn_blocking(move || CsvCodec.decode(&bytes))
        .await
        .context("CSV decoder task failed")?
        .with_context(|| format!("{} is not a readable CSV file", path.display()))?;
    Ok(rows)
}
