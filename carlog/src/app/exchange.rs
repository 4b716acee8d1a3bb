use strum::Display;

use super::*;
use crate::error::ImportRowError;
use crate::exchange::{export_rows, import_rows, ImportReport, TabularRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ExchangeKind {
    #[strum(serialize = "import")]
    Import,
    #[strum(serialize = "export")]
    Export,
}

/// Proof that an import or export is in flight. Hand it back to
/// `finish_*` or [`App::abort_exchange`] to release the slot.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct ExchangeTicket {
    kind: ExchangeKind,
}

impl ExchangeTicket {
    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    /// Claim the import or export slot. A second claim of the same kind
    /// fails until the first ticket is returned.
    pub fn begin_exchange(&mut self, kind: ExchangeKind) -> Result<ExchangeTicket, AppError> {
        if !self.exchanges_in_flight.insert(kind) {
            return Err(AppError::ExchangeInFlight(kind));
        }
        debug!(%kind, "Exchange started");
        Ok(ExchangeTicket { kind })
    }

    pub fn is_exchange_in_flight(&self, kind: ExchangeKind) -> bool {
        self.exchanges_in_flight.contains(&kind)
    }

    /// Rows for the codec, in collection order.
    pub fn export_snapshot(&self) -> Vec<TabularRow> {
        export_rows(&self.records)
    }

    pub fn finish_export(&mut self, ticket: ExchangeTicket) {
        info!(records = self.records.len(), "Export finished");
        self.release(ticket);
    }

    /// Append decoded rows to the ledger. Bad rows are skipped and reported.
    pub fn finish_import<I>(&mut self, ticket: ExchangeTicket, rows: I) -> ImportReport
    where
        I: IntoIterator<Item = Result<TabularRow, ImportRowError>>,
    {
        let report = import_rows(rows, &mut self.factory);
        self.release(ticket);

        if report.records.is_empty() {
            return report;
        }

        self.total_cost = self.total_cost.saturating_add(report.total_cost());
        self.records.extend(report.records.iter().cloned());
        info!(
            imported = report.imported(),
            skipped = report.skipped.len(),
            "Import merged"
        );
        self.mark_mutated();
        report
    }

    /// Give the slot back without touching the ledger, e.g. after a codec failure.
    pub fn abort_exchange(&mut self, ticket: ExchangeTicket) {
        warn!(kind = %ticket.kind, "Exchange aborted");
        self.release(ticket);
    }

    fn release(&mut self, ticket: ExchangeTicket) {
        self.exchanges_in_flight.remove(&ticket.kind);
    }
}
