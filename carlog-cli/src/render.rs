use carlog::{ImportReport, Record, ViewPage};
use std::fmt::Write;

/// Thousands-separated won amount, e.g. `23,400원`.
pub fn won(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('원');
    out
}

fn record_line(record: &Record) -> String {
    format!(
        "{:>14}  {:<14}  {:<24}  {:>10}  {:>10}  {:>10}",
        record.id(),
        record.date(),
        record.route(),
        won(record.toll_fee()),
        won(record.fuel_cost()),
        won(record.total()),
    )
}

pub fn page(view: &ViewPage<'_>, current_page: usize) -> String {
    let mut out = String::new();
    if view.records.is_empty() {
        out.push_str("기록이 없습니다\n");
    } else {
        let _ = writeln!(
            out,
            "{:>14}  {:<14}  {:<24}  {:>10}  {:>10}  {:>10}",
            "ID", "날짜", "경로", "통행료", "주유비", "합계"
        );
        for record in &view.records {
            out.push_str(&record_line(record));
            out.push('\n');
        }
    }
    let _ = writeln!(
        out,
        "{}/{} 페이지 ({}건)",
        current_page, view.total_pages, view.matched
    );
    out
}

pub fn total(total_cost: u64, count: usize) -> String {
    format!("총 {}건, 합계 {}", count, won(total_cost))
}

pub fn added(record: &Record) -> String {
    format!(
        "추가됨: #{} {} {}",
        record.id(),
        record.route(),
        won(record.total())
    )
}

pub fn import_summary(report: &ImportReport) -> String {
    let mut out = format!(
        "{}건 가져옴 (합계 {})",
        report.imported(),
        won(report.total_cost())
    );
    if !report.skipped.is_empty() {
        let _ = write!(out, ", {}건 건너뜀", report.skipped.len());
        for skipped in &report.skipped {
            let _ = write!(out, "\n  {skipped}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use carlog::{App, AppSettings, ImportRowError, ManualClock, MemoryStore, NewTrip};
    use time::macros::datetime;

    #[test]
    fn won_groups_thousands() {
        assert_eq!(won(0), "0원");
        assert_eq!(won(999), "999원");
        assert_eq!(won(23_400), "23,400원");
        assert_eq!(won(1_234_567), "1,234,567원");
    }

    #[test]
    fn page_shows_rows_and_indicator() {
        let clock = ManualClock::new(datetime!(2024-03-01 09:00 +9));
        let mut app = App::new(MemoryStore::new(), clock, AppSettings::default());
        app.add(NewTrip::new("서울", "부산", 23_400, 80_000)).unwrap();

        let text = page(&app.view(), app.current_page());
        assert!(text.contains("서울 → 부산"));
        assert!(text.contains("103,400원"));
        assert!(text.ends_with("1/1 페이지 (1건)\n"));
    }

    #[test]
    fn import_summary_lists_skipped_rows() {
        let report = ImportReport {
            records: Vec::new(),
            skipped: vec![ImportRowError::BlankRow { row: 3 }],
        };
        assert_eq!(
            import_summary(&report),
            "0건 가져옴 (합계 0원), 1건 건너뜀\n  row 3: no usable cells"
        );
    }

    #[test]
    fn empty_page_says_so() {
        let clock = ManualClock::new(datetime!(2024-03-01 09:00 +9));
        let app = App::new(MemoryStore::new(), clock, AppSettings::default());
        let text = page(&app.view(), app.current_page());
        assert!(text.starts_with("기록이 없습니다"));
        assert!(text.contains("1/1 페이지 (0건)"));
    }
}
