use anyhow::{Context, Result};
use carlog::{Clock, KeyValueStore};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;

use super::action_queue::channel;
use super::actions::{parse_line, run_action, Reply, HELP};
use crate::bootstrap::Session;
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Line-driven session. Debounced work runs on a fixed tick between lines.
/// The ledger is flushed once more when the session ends, however it ends.
pub async fn run_shell<S, C, R, W>(session: &mut Session<S, C>, input: R, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let outcome = drive(session, input, out).await;
    let saved = session
        .app
        .shutdown()
        .context("Failed to save ledger on exit");
    outcome?;
    saved?;
    Ok(())
}

async fn drive<S, C, R, W>(session: &mut Session<S, C>, input: R, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (action_tx, mut action_rx) = channel();
    let mut lines = input.lines();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    writeln!(out, "{HELP}\n")?;
    write!(out, "{}", render::page(&session.app.view(), session.app.current_page()))?;

    'session: loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break 'session;
                };
                match parse_line(&line) {
                    Ok(Some(action)) => {
                        let _ = action_tx.send(action);
                    }
                    Ok(None) => {}
                    Err(e) => writeln!(out, "{e:#}")?,
                }
            }
            _ = ticker.tick() => {
                if session.app.poll() {
                    write!(out, "{}", render::page(&session.app.view(), session.app.current_page()))?;
                }
            }
        }

        while let Ok(action) = action_rx.try_recv() {
            match run_action(action, session).await? {
                Reply::Text(text) => writeln!(out, "{text}")?,
                Reply::Silent => {}
                Reply::Quit => break 'session,
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::open_with;
    use crate::config::CarlogConfig;
    use carlog::{ManualClock, MemoryStore};
    use time::macros::datetime;

    fn session(store: MemoryStore) -> Session<MemoryStore, ManualClock> {
        let config = CarlogConfig {
            seed_sample_data: false,
            ..CarlogConfig::default()
        };
        let clock = ManualClock::new(datetime!(2024-03-01 09:00 +9));
        open_with(store, clock, &config).unwrap()
    }

    #[tokio::test]
    async fn quit_flushes_pending_changes() {
        let store = MemoryStore::new();
        let mut session = session(store.clone());
        let mut out = Vec::new();

        let input: &[u8] = "add 서울 부산 1000 2000\nbogus\nquit\nadd 대전 광주\n".as_bytes();
        run_shell(&mut session, input, &mut out).await.unwrap();

        assert_eq!(session.app.len(), 1);
        assert!(!session.app.is_dirty());
        let saved = store.raw("car_expense_data").expect("ledger written");
        assert!(saved.contains("서울 → 부산"));

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("추가됨"));
        assert!(out.contains("알 수 없는 명령어: 'bogus'"));
    }

    #[tokio::test]
    async fn end_of_input_also_flushes() {
        let store = MemoryStore::new();
        let mut session = session(store.clone());
        let mut out = Vec::new();

        let input: &[u8] = "add 인천 강릉 0 45000\n".as_bytes();
        run_shell(&mut session, input, &mut out).await.unwrap();

        assert!(store.raw("car_expense_data").is_some());
    }
}
