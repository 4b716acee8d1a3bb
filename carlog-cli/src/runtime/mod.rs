mod action_queue;
mod actions;
mod event_loop;
mod exchange;

pub use event_loop::run_shell;
pub use exchange::{export_to, import_from};
