use anyhow::{bail, Context, Result};
use carlog::exchange::coerce_amount;
use carlog::{Clock, KeyValueStore, NewTrip, RecordId};
use std::io::Write;

use crate::bootstrap::Session;
use crate::cli::Commands;
use crate::render;
use crate::runtime;

/// Run one ledger command, then flush the ledger whether or not the command
/// succeeded. The command's own error wins over a failed save.
pub async fn run<S, C, W>(command: Commands, session: &mut Session<S, C>, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
    W: Write,
{
    if let Commands::Shell = command {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        return runtime::run_shell(session, stdin, out).await;
    }

    let outcome = execute(command, session, out).await;
    let saved = session.app.shutdown().context("Failed to save ledger");
    outcome?;
    saved?;
    Ok(())
}

async fn execute<S, C, W>(command: Commands, session: &mut Session<S, C>, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
    W: Write,
{
    let app = &mut session.app;

    match command {
        Commands::Add {
            origin,
            destination,
            toll,
            fuel,
        } => {
            let toll_fee = match toll {
                Some(raw) => coerce_amount(Some(&raw)),
                None => session.tolls.lookup(&origin, &destination),
            };
            let fuel_cost = coerce_amount(Some(&fuel));
            let record = app.add(NewTrip::new(origin, destination, toll_fee, fuel_cost))?;
            writeln!(out, "{}", render::added(record))?;
        }
        Commands::List { search, sort, page } => {
            app.apply_search_now(search.unwrap_or_default());
            app.set_sort(sort);
            if !app.go_to_page(page) {
                bail!("Page {page} is out of range (1-{})", app.total_pages());
            }
            write!(out, "{}", render::page(&app.view(), app.current_page()))?;
        }
        Commands::Total => writeln!(out, "{}", render::total(app.total_cost(), app.len()))?,
        Commands::Remove { id } => {
            let record = app.remove(RecordId(id))?;
            writeln!(out, "삭제됨: {} {}", record.id(), record.route())?;
        }
        Commands::Reset => {
            app.clear();
            writeln!(out, "모든 기록을 삭제했습니다")?;
        }
        Commands::Export { path } => {
            let count = runtime::export_to(app, &path).await?;
            writeln!(out, "{count}건을 {}에 저장했습니다", path.display())?;
        }
        Commands::Import { path } => {
            let report = runtime::import_from(app, &path).await?;
            writeln!(out, "{}", render::import_summary(&report))?;
        }
        // Handled by the caller.
        Commands::Shell | Commands::ConfigPath => {}
    }
    Ok(())
}
