use anyhow::{bail, Context, Result};
use carlog::exchange::coerce_amount;
use carlog::{App, Clock, KeyValueStore, NewTrip, RecordId, SortDirective};
use std::path::PathBuf;
use tracing::debug;

use super::action_queue::Action;
use super::exchange::{export_to, import_from};
use crate::bootstrap::Session;
use crate::render;

pub(super) const HELP: &str = "\
명령어:
  add <출발지> <도착지> [통행료] [주유비]   기록 추가 (통행료 생략 시 요금표 조회)
  search [검색어]                           경로/날짜 검색 (비우면 전체)
  sort <date-desc|date-asc|cost-desc|cost-asc|none>
  list | next | prev | page <n>             목록 보기와 페이지 이동
  total                                     합계
  rm <id>                                   기록 삭제
  reset                                     전체 삭제
  import <파일> | export <파일>             CSV 가져오기/내보내기
  help | quit";

/// What the loop should do after an action ran.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Reply {
    Text(String),
    Silent,
    Quit,
}

/// Parse one shell line. Blank lines parse to `None`.
pub(super) fn parse_line(line: &str) -> Result<Option<Action>> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let action = match command.to_lowercase().as_str() {
        "" => return Ok(None),
        "add" | "a" => {
            let [origin, destination, amounts @ ..] = args.as_slice() else {
                bail!("사용법: add <출발지> <도착지> [통행료] [주유비]");
            };
            if amounts.len() > 2 {
                bail!("사용법: add <출발지> <도착지> [통행료] [주유비]");
            }
            Action::Add {
                origin: origin.to_string(),
                destination: destination.to_string(),
                toll_fee: amounts.first().map(|raw| coerce_amount(Some(*raw))),
                fuel_cost: coerce_amount(amounts.get(1).copied()),
            }
        }
        "search" | "s" | "/" => Action::Search {
            term: rest.to_string(),
        },
        "sort" => {
            let directive = rest.parse::<SortDirective>().with_context(|| {
                format!("알 수 없는 정렬: '{rest}' (date-desc, date-asc, cost-desc, cost-asc, none)")
            })?;
            Action::Sort(directive)
        }
        "next" | "n" => Action::NextPage,
        "prev" | "p" => Action::PrevPage,
        "page" => {
            let page = rest
                .parse::<usize>()
                .with_context(|| format!("페이지 번호가 아닙니다: '{rest}'"))?;
            Action::GoToPage(page)
        }
        "list" | "ls" => Action::Show,
        "total" => Action::Total,
        "rm" | "remove" => {
            let id = rest
                .parse::<u64>()
                .with_context(|| format!("기록 ID가 아닙니다: '{rest}'"))?;
            Action::Remove(RecordId(id))
        }
        "reset" => Action::Reset,
        "import" | "export" if rest.is_empty() => bail!("사용법: {command} <파일>"),
        "import" => Action::Import(PathBuf::from(rest)),
        "export" => Action::Export(PathBuf::from(rest)),
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => bail!("알 수 없는 명령어: '{other}' (help 참고)"),
    };
    Ok(Some(action))
}

pub(super) async fn run_action<S: KeyValueStore, C: Clock>(
    action: Action,
    session: &mut Session<S, C>,
) -> Result<Reply> {
    debug!(?action, "Running action");
    let app = &mut session.app;

    let reply = match action {
        Action::Add {
            origin,
            destination,
            toll_fee,
            fuel_cost,
        } => {
            let toll_fee = toll_fee.unwrap_or_else(|| session.tolls.lookup(&origin, &destination));
            match app.add(NewTrip::new(origin, destination, toll_fee, fuel_cost)) {
                Ok(record) => Reply::Text(render::added(record)),
                Err(e) => Reply::Text(e.to_string()),
            }
        }
        Action::Search { term } => {
            app.set_search_input(term);
            Reply::Silent
        }
        Action::Sort(sort) => {
            app.set_sort(sort);
            Reply::Text(render::page(&app.view(), app.current_page()))
        }
        Action::NextPage => {
            let moved = app.paginate(1);
            page_reply(app, moved)
        }
        Action::PrevPage => {
            let moved = app.paginate(-1);
            page_reply(app, moved)
        }
        Action::GoToPage(page) => {
            let moved = app.go_to_page(page);
            page_reply(app, moved)
        }
        Action::Show => Reply::Text(render::page(&app.view(), app.current_page())),
        Action::Total => Reply::Text(render::total(app.total_cost(), app.len())),
        Action::Remove(id) => match app.remove(id) {
            Ok(record) => Reply::Text(format!("삭제됨: {} {}", record.id(), record.route())),
            Err(e) => Reply::Text(e.to_string()),
        },
        Action::Reset => {
            app.clear();
            Reply::Text("모든 기록을 삭제했습니다".to_string())
        }
        Action::Import(path) => match import_from(app, &path).await {
            Ok(report) => Reply::Text(render::import_summary(&report)),
            Err(e) => Reply::Text(format!("가져오기 실패: {e:#}")),
        },
        Action::Export(path) => match export_to(app, &path).await {
            Ok(count) => Reply::Text(format!("{count}건을 {}에 저장했습니다", path.display())),
            Err(e) => Reply::Text(format!("내보내기 실패: {e:#}")),
        },
        Action::Help => Reply::Text(HELP.to_string()),
        Action::Quit => Reply::Quit,
    };
    Ok(reply)
}

fn page_reply<S: KeyValueStore, C: Clock>(app: &App<S, C>, moved: bool) -> Reply {
    if moved {
        Reply::Text(render::page(&app.view(), app.current_page()))
    } else {
        Reply::Text(format!("이동할 수 없습니다 (전체 {}페이지)", app.total_pages()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::open_with;
    use crate::config::CarlogConfig;
    use carlog::{ManualClock, MemoryStore, TollRate};
    use time::macros::datetime;

    fn session() -> Session<MemoryStore, ManualClock> {
        let config = CarlogConfig {
            seed_sample_data: false,
            tolls: vec![TollRate {
                origin: "서울".to_string(),
                destination: "부산".to_string(),
                fee: 23_400,
            }],
            ..CarlogConfig::default()
        };
        let clock = ManualClock::new(datetime!(2024-03-01 09:00 +9));
        open_with(MemoryStore::new(), clock, &config).unwrap()
    }

    async fn run(session: &mut Session<MemoryStore, ManualClock>, line: &str) -> Reply {
        let action = parse_line(line).unwrap().unwrap();
        run_action(action, session).await.unwrap()
    }

    #[test]
    fn parses_add_with_and_without_amounts() {
        assert_eq!(
            parse_line("add 서울 부산").unwrap(),
            Some(Action::Add {
                origin: "서울".to_string(),
                destination: "부산".to_string(),
                toll_fee: None,
                fuel_cost: 0,
            })
        );
        assert_eq!(
            parse_line("  add 대전 광주 9,800 30000원 ").unwrap(),
            Some(Action::Add {
                origin: "대전".to_string(),
                destination: "광주".to_string(),
                toll_fee: Some(9_800),
                fuel_cost: 30_000,
            })
        );
        assert!(parse_line("add 서울").is_err());
        assert!(parse_line("add 서울 부산 1 2 3").is_err());
    }

    #[test]
    fn parses_navigation_and_misc() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("n").unwrap(), Some(Action::NextPage));
        assert_eq!(parse_line("page 3").unwrap(), Some(Action::GoToPage(3)));
        assert_eq!(
            parse_line("sort cost-asc").unwrap(),
            Some(Action::Sort(SortDirective::CostAsc))
        );
        assert_eq!(
            parse_line("rm 42").unwrap(),
            Some(Action::Remove(RecordId(42)))
        );
        assert_eq!(
            parse_line("search 서울 부산").unwrap(),
            Some(Action::Search {
                term: "서울 부산".to_string()
            })
        );
        assert!(parse_line("sort price").is_err());
        assert!(parse_line("export").is_err());
        assert!(parse_line("fly").is_err());
    }

    #[tokio::test]
    async fn add_uses_toll_schedule_when_fee_omitted() {
        let mut session = session();
        run(&mut session, "add 부산 서울 0 50000").await;
        run(&mut session, "add 부산 서울").await;

        let records = session.app.records();
        assert_eq!(records[0].toll_fee(), 23_400);
        assert_eq!(records[1].toll_fee(), 0);
        assert_eq!(session.app.total_cost(), 73_400);
    }

    #[tokio::test]
    async fn rejected_trip_is_reported_not_fatal() {
        let mut session = session();
        let action = Action::Add {
            origin: "  ".to_string(),
            destination: "부산".to_string(),
            toll_fee: Some(0),
            fuel_cost: 0,
        };
        let reply = run_action(action, &mut session).await.unwrap();
        assert_eq!(reply, Reply::Text("출발지을(를) 입력해주세요".to_string()));
    }

    #[tokio::test]
    async fn search_waits_for_poll() {
        let mut session = session();
        run(&mut session, "add 서울 부산").await;
        run(&mut session, "add 대전 광주").await;

        assert_eq!(run(&mut session, "search 광주").await, Reply::Silent);
        assert_eq!(session.app.view().matched, 2);

        session.app.clock().advance(time::Duration::milliseconds(300));
        assert!(session.app.poll());
        assert_eq!(session.app.view().matched, 1);
    }

    #[tokio::test]
    async fn out_of_range_page_is_explained() {
        let mut session = session();
        let reply = run(&mut session, "next").await;
        assert_eq!(
            reply,
            Reply::Text("이동할 수 없습니다 (전체 1페이지)".to_string())
        );
    }

    #[tokio::test]
    async fn remove_unknown_id_is_reported() {
        let mut session = session();
        let Reply::Text(text) = run(&mut session, "rm 7").await else {
            panic!("expected text reply");
        };
        assert!(text.contains("record not found"));
    }

    #[tokio::test]
    async fn quit_ends_the_session() {
        let mut session = session();
        assert_eq!(run(&mut session, "quit").await, Reply::Quit);
    }
}
