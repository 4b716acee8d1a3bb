use crate::error::{CodecError, ImportRowError};
use crate::exchange::{Column, TabularRow};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Converts rows to and from a workbook byte format.
pub trait SheetCodec {
    fn encode(&self, rows: &[TabularRow]) -> Result<Vec<u8>, CodecError>;

    /// Per-row failures are returned inline; only a file-level failure is an `Err`.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Result<TabularRow, ImportRowError>>, CodecError>;
}

/// CSV with a UTF-8 byte order mark so spreadsheet apps detect Hangul correctly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCodec;

impl SheetCodec for CsvCodec {
    fn encode(&self, rows: &[TabularRow]) -> Result<Vec<u8>, CodecError> {
        let headers: Vec<&str> = match rows.first() {
            Some(row) => row.cells().map(|(label, _)| label).collect(),
            None => Column::ALL.iter().map(|c| c.label()).collect(),
        };

        let mut writer = csv::WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
        writer.write_record(&headers)?;
        for row in rows {
            let values: Vec<&str> = headers
                .iter()
                .map(|label| {
                    row.cells()
                        .find(|(l, _)| l == label)
                        .map(|(_, v)| v)
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&values)?;
        }

        writer
            .into_inner()
            .map_err(|e| CodecError::Io(e.into_error()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Result<TabularRow, ImportRowError>>, CodecError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(CodecError::MissingHeader);
        }

        Ok(reader
            .records()
            .enumerate()
            .map(|(i, record)| {
                let record = record.map_err(|e| ImportRowError::Unreadable {
                    row: i + 1,
                    reason: e.to_string(),
                })?;
                Ok(headers
                    .iter()
                    .zip(record.iter())
                    .fold(TabularRow::new(), |row, (label, value)| {
                        row.with(label.as_str(), value)
                    }))
            })
            .collect())
    }
}
