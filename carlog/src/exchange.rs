//! Mapping between records and labeled spreadsheet rows.

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::ImportRowError;
use crate::record::{sum_totals, Record, RecordFactory, MAX_AMOUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Origin,
    Destination,
    Route,
    Toll,
    Fuel,
    Total,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Date,
        Column::Origin,
        Column::Destination,
        Column::Route,
        Column::Toll,
        Column::Fuel,
        Column::Total,
    ];

    /// Header label. These must not change between versions.
    pub fn label(self) -> &'static str {
        match self {
            Column::Date => "날짜",
            Column::Origin => "출발지",
            Column::Destination => "도착지",
            Column::Route => "경로",
            Column::Toll => "통행료",
            Column::Fuel => "주유비",
            Column::Total => "합계",
        }
    }
}

/// Fallbacks for cells that are missing or unusable on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportDefaults {
    pub place: &'static str,
    pub amount: u64,
}

pub const IMPORT_DEFAULTS: ImportDefaults = ImportDefaults {
    place: "알 수 없음",
    amount: 0,
};

/// An ordered list of (label, value) cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularRow {
    cells: Vec<(String, String)>,
}

impl TabularRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.cells.push((label.into(), value.into()));
    }

    /// First cell with this label, trimmed. Blank cells count as missing.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(l, _)| l.trim() == label)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn column(&self, column: Column) -> Option<&str> {
        self.get(column.label())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

pub fn export_rows(records: &[Record]) -> Vec<TabularRow> {
    records
        .iter()
        .map(|record| {
            Column::ALL
                .iter()
                .fold(TabularRow::new(), |row, column| {
                    let value = match column {
                        Column::Date => record.date().to_string(),
                        Column::Origin => record.origin().to_string(),
                        Column::Destination => record.destination().to_string(),
                        Column::Route => record.route().to_string(),
                        Column::Toll => record.toll_fee().to_string(),
                        Column::Fuel => record.fuel_cost().to_string(),
                        Column::Total => record.total().to_string(),
                    };
                    row.with(column.label(), value)
                })
        })
        .collect()
}

/// A row after coercion, before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub date: Option<String>,
    pub origin: String,
    pub destination: String,
    pub toll_fee: u64,
    pub fuel_cost: u64,
}

/// Apply the import defaulting rules to one row. `row_number` is 1-based.
pub fn parse_row(row_number: usize, row: &TabularRow) -> Result<ParsedRow, ImportRowError> {
    let date = row.column(Column::Date);
    let origin = row.column(Column::Origin);
    let destination = row.column(Column::Destination);
    let toll = row.column(Column::Toll);
    let fuel = row.column(Column::Fuel);

    if [date, origin, destination, toll, fuel]
        .iter()
        .all(Option::is_none)
    {
        return Err(ImportRowError::BlankRow { row: row_number });
    }

    Ok(ParsedRow {
        date: date.map(str::to_string),
        origin: origin.unwrap_or(IMPORT_DEFAULTS.place).to_string(),
        destination: destination.unwrap_or(IMPORT_DEFAULTS.place).to_string(),
        toll_fee: coerce_amount(toll),
        fuel_cost: coerce_amount(fuel),
    })
}

/// Lenient currency parsing: "12,300", "12300원", "₩ 500", "1500.7".
/// Anything unparseable, negative or above [`MAX_AMOUNT`] becomes the
/// default amount.
pub fn coerce_amount(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return IMPORT_DEFAULTS.amount;
    };
    let cleaned: String = raw
        .trim()
        .trim_end_matches('원')
        .chars()
        .filter(|c| !matches!(c, ',' | '₩' | '_') && !c.is_whitespace())
        .collect();

    if let Ok(value) = cleaned.parse::<i64>() {
        return u64::try_from(value)
            .ok()
            .filter(|amount| *amount <= MAX_AMOUNT)
            .unwrap_or(IMPORT_DEFAULTS.amount);
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=MAX_AMOUNT as f64).contains(&value) => {
            value.trunc() as u64
        }
        _ => IMPORT_DEFAULTS.amount,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub records: Vec<Record>,
    pub skipped: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.records.len()
    }

    pub fn total_cost(&self) -> u64 {
        sum_totals(&self.records)
    }
}

/// Turn rows into records. Bad rows are skipped and reported, never fatal.
///
/// Every record gets a fresh id; timestamps are the batch start plus the
/// row's index, so records in one batch never share a timestamp.
pub fn import_rows<C, I>(rows: I, factory: &mut RecordFactory<C>) -> ImportReport
where
    C: Clock,
    I: IntoIterator<Item = Result<TabularRow, ImportRowError>>,
{
    let rows: Vec<_> = rows.into_iter().collect();
    let batch_start = factory.reserve_timestamps(rows.len());
    let today = factory.today();
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let parsed = row.and_then(|row| parse_row(index + 1, &row));
        match parsed {
            Ok(parsed) => {
                let id = factory.next_id();
                report.records.push(Record::from_parts(
                    id,
                    parsed.date.unwrap_or_else(|| today.clone()),
                    parsed.origin,
                    parsed.destination,
                    parsed.toll_fee,
                    parsed.fuel_cost,
                    batch_start + index as i64,
                ));
            }
            Err(e) => {
                warn!(error = %e, "Skipping import row");
                report.skipped.push(e);
            }
        }
    }

    info!(
        imported = report.imported(),
        skipped = report.skipped.len(),
        "Import rows converted"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::record::NewTrip;
    use time::macros::datetime;

    fn factory() -> RecordFactory<ManualClock> {
        RecordFactory::new(ManualClock::new(datetime!(2024-03-01 09:30 +9)))
    }

    fn row(origin: &str, destination: &str, toll: &str, fuel: &str) -> TabularRow {
        TabularRow::new()
            .with("날짜", "2024. 2. 10.")
            .with("출발지", origin)
            .with("도착지", destination)
            .with("통행료", toll)
            .with("주유비", fuel)
    }

    #[test]
    fn export_uses_stable_labels_in_order() {
        let mut factory = factory();
        let record = factory
            .create(NewTrip::new("서울", "강릉", 12_000, 40_000))
            .unwrap();

        let rows = export_rows(&[record]);
        let cells: Vec<_> = rows[0].cells().collect();
        assert_eq!(
            cells,
            vec![
                ("날짜", "2024. 3. 1."),
                ("출발지", "서울"),
                ("도착지", "강릉"),
                ("경로", "서울 → 강릉"),
                ("통행료", "12000"),
                ("주유비", "40000"),
                ("합계", "52000"),
            ]
        );
    }

    #[test]
    fn export_then_import_reproduces_records() {
        let mut factory = factory();
        let originals = vec![
            factory.create(NewTrip::new("서울", "부산", 23_400, 61_000)).unwrap(),
            factory.create(NewTrip::new("대전", "광주", 0, 35_500)).unwrap(),
        ];

        let rows = export_rows(&originals).into_iter().map(Ok);
        let report = import_rows(rows, &mut factory);

        assert!(report.skipped.is_empty());
        for (original, imported) in originals.iter().zip(&report.records) {
            assert_ne!(original.id(), imported.id());
            assert_eq!(original.date(), imported.date());
            assert_eq!(original.route(), imported.route());
            assert_eq!(original.toll_fee(), imported.toll_fee());
            assert_eq!(original.fuel_cost(), imported.fuel_cost());
            assert_eq!(original.total(), imported.total());
        }
    }

    #[test]
    fn non_numeric_amounts_coerce_to_zero_without_failing_batch() {
        let rows = vec![
            Ok(row("서울", "부산", "abc", "1,500원")),
            Ok(row("인천", "수원", "3000", "")),
            Ok(row("대구", "울산", "-20", "n/a")),
        ];
        let report = import_rows(rows, &mut factory());

        assert_eq!(report.imported(), 3);
        assert_eq!(report.records[0].toll_fee(), 0);
        assert_eq!(report.records[0].fuel_cost(), 1_500);
        assert_eq!(report.records[1].total(), 3_000);
        assert_eq!(report.records[2].total(), 0);
    }

    #[test]
    fn missing_places_default_to_unknown() {
        let rows = vec![Ok(TabularRow::new().with("통행료", "700"))];
        let report = import_rows(rows, &mut factory());

        let record = &report.records[0];
        assert_eq!(record.origin(), "알 수 없음");
        assert_eq!(record.route(), "알 수 없음 → 알 수 없음");
        assert_eq!(record.date(), "2024. 3. 1.");
    }

    #[test]
    fn imported_total_column_is_ignored() {
        let rows = vec![Ok(row("A", "B", "10", "20").with("합계", "99999"))];
        let report = import_rows(rows, &mut factory());
        assert_eq!(report.records[0].total(), 30);
    }

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let rows = vec![
            Ok(row("A", "B", "1", "1")),
            Ok(TabularRow::new().with("합계", "10").with("메모", "x")),
            Err(ImportRowError::Unreadable {
                row: 3,
                reason: "invalid UTF-8".into(),
            }),
            Ok(row("C", "D", "2", "2")),
        ];
        let report = import_rows(rows, &mut factory());

        assert_eq!(report.imported(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0], ImportRowError::BlankRow { row: 2 });
        assert_eq!(report.total_cost(), 6);
    }

    #[test]
    fn batch_timestamps_are_distinct_and_ordered() {
        let rows = (0..5).map(|i| Ok(row("A", &format!("B{i}"), "0", "0")));
        let report = import_rows(rows, &mut factory());

        let stamps: Vec<i64> = report.records.iter().map(Record::timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn coerce_amount_rules() {
        assert_eq!(coerce_amount(Some(" 12,300 ")), 12_300);
        assert_eq!(coerce_amount(Some("₩ 500")), 500);
        assert_eq!(coerce_amount(Some("1500.9")), 1_500);
        assert_eq!(coerce_amount(Some("-1")), 0);
        assert_eq!(coerce_amount(Some("NaN")), 0);
        assert_eq!(coerce_amount(None), 0);
        assert_eq!(coerce_amount(Some("1000000000000000")), MAX_AMOUNT);
        assert_eq!(coerce_amount(Some("1000000000000001")), 0);
        assert_eq!(coerce_amount(Some("99999999999999999999")), 0);
        assert_eq!(coerce_amount(Some("1e300")), 0);
    }
}
