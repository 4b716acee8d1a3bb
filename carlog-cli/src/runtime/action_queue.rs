use carlog::{RecordId, SortDirective};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Action {
    Add {
        origin: String,
        destination: String,
        /// `None` means look the fee up in the toll schedule.
        toll_fee: Option<u64>,
        fuel_cost: u64,
    },
    Search {
        term: String,
    },
    Sort(SortDirective),
    NextPage,
    PrevPage,
    GoToPage(usize),
    Show,
    Total,
    Remove(RecordId),
    Reset,
    Import(PathBuf),
    Export(PathBuf),
    Help,
    Quit,
}

pub(super) type ActionTx = UnboundedSender<Action>;
pub(super) type ActionRx = UnboundedReceiver<Action>;

pub(super) fn channel() -> (ActionTx, ActionRx) {
    mpsc::unbounded_channel()
}
