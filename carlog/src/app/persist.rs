use super::*;
use crate::clock::epoch_millis;

impl<S: KeyValueStore, C: Clock> App<S, C> {
    /// Run whatever debounced work is due. Returns true when the visible
    /// list changed because a pending search was applied.
    pub fn poll(&mut self) -> bool {
        let now = self.factory.clock().now();
        let searched = self.search_debounce.fire_if_due(now) && self.apply_pending_search();

        if self.persist_debounce.fire_if_due(now) {
            // Failures are logged by flush; the write stays pending.
            let _ = self.flush();
        }
        searched
    }

    /// Save now. On failure the in-memory ledger stays authoritative and the
    /// next mutation schedules another attempt.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        self.reconcile_total();
        let now = self.factory.clock().now();
        match self.persistence.save(&self.records, self.total_cost, now) {
            Ok(()) => {
                self.dirty = false;
                self.last_saved = Some(epoch_millis(now));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to save ledger, keeping changes in memory");
                Err(e)
            }
        }
    }

    /// Final, non-debounced save at the end of a session.
    pub fn shutdown(&mut self) -> Result<(), PersistenceError> {
        self.persist_debounce.cancel();
        self.search_debounce.cancel();
        self.flush()
    }

    /// Recompute the aggregate from the records. Returns true if it had drifted.
    pub fn reconcile_total(&mut self) -> bool {
        let recomputed = sum_totals(&self.records);
        if recomputed == self.total_cost {
            return false;
        }
        warn!(
            tracked = self.total_cost,
            recomputed, "Aggregate total drifted, reconciling"
        );
        self.total_cost = recomputed;
        true
    }

    /// True when there are changes not yet written to storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_pending_write(&self) -> bool {
        self.persist_debounce.is_pending()
    }

    /// Epoch millis of the last successful save, including the loaded one.
    pub fn last_saved(&self) -> Option<i64> {
        self.last_saved
    }
}
