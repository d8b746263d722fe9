use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::Candle;
use std::io::Read;
use std::path::Path;

/// Reads exchange-style OHLCV exports.
///
/// CSV Header: timestamp,open,high,low,close,volume
/// Example Row: 1704067200000,42283.58,42554.57,42261.02,42475.23,1271.68
///
/// `timestamp` is epoch milliseconds (the shape exchanges return OHLCV in).
/// Columns are located by header name, so their order does not matter.
pub struct OhlcvCsvParser;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

impl OhlcvCsvParser {
    pub fn load_candles_from_csv(file_path: impl AsRef<Path>) -> Result<Vec<Candle>> {
        let path = file_path.as_ref();
        let file = std::fs::File::open(path).with_context(|| format!("Failed to open CSV file '{}'", path.display()))?;
        Self::load_candles(file)
    }

    pub fn load_candles<R: Read>(reader: R) -> Result<Vec<Candle>> {
        let mut rdr = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let mut positions = [0usize; 6];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("Missing '{}' column in CSV header", name))?;
        }

        let mut candles = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.with_context(|| format!("Error reading CSV record at line {}", line))?;
            candles.push(Self::parse_record(&record, &positions, line)?);
        }
        Ok(candles)
    }

    fn parse_record(record: &StringRecord, positions: &[usize; 6], line: usize) -> Result<Candle> {
        let raw_ts = field(record, positions, 0, line)?;
        let millis: i64 = raw_ts
            .parse()
            .map_err(|e| anyhow!("Error parsing 'timestamp' at line {}: '{}' ({})", line, raw_ts, e))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow!("Timestamp out of range at line {}: {}", line, millis))?;

        Ok(Candle {
            timestamp,
            open: number(record, positions, 1, line)?,
            high: number(record, positions, 2, line)?,
            low: number(record, positions, 3, line)?,
            close: number(record, positions, 4, line)?,
            volume: number(record, positions, 5, line)?,
        })
    }
}

fn field<'a>(record: &'a StringRecord, positions: &[usize; 6], column: usize, line: usize) -> Result<&'a str> {
    record
        .get(positions[column])
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", COLUMNS[column], line))
}

fn number(record: &StringRecord, positions: &[usize; 6], column: usize, line: usize) -> Result<f64> {
    let raw = field(record, positions, column, line)?;
    let value: f64 = raw
        .parse()
        .map_err(|e| anyhow!("Error parsing '{}' at line {}: '{}' ({})", COLUMNS[column], line, raw, e))?;
    if !value.is_finite() {
        return Err(anyhow!("Error parsing '{}' at line {}: value is not finite", COLUMNS[column], line));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_candles_from_csv_valid_data() {
        let csv_content = "\
timestamp,open,high,low,close,volume
1704067200000,42283.58,42554.57,42261.02,42475.23,1271.68
1704070800000,42475.23,42775.00,42431.65,42613.56,1196.37";
        let tmp_file = create_test_csv(csv_content);
        let candles = OhlcvCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp.timestamp_millis(), 1704067200000);
        assert_eq!(candles[0].open, 42283.58);
        assert_eq!(candles[0].high, 42554.57);
        assert_eq!(candles[0].low, 42261.02);
        assert_eq!(candles[0].close, 42475.23);
        assert_eq!(candles[0].volume, 1271.68);
        assert_eq!(candles[1].close, 42613.56);
    }

    #[test]
    fn test_columns_found_by_name() {
        let csv_content = "\
close, volume, timestamp, open, high, low
10.5, 3, 1704067200000, 10, 11, 9";
        let candles = OhlcvCsvParser::load_candles(csv_content.as_bytes()).unwrap();
        assert_eq!(candles[0].close, 10.5);
        assert_eq!(candles[0].low, 9.0);
    }

    #[test]
    fn test_load_candles_from_csv_empty_file() {
        let tmp_file = create_test_csv("timestamp,open,high,low,close,volume");
        let candles = OhlcvCsvParser::load_candles_from_csv(tmp_file.path()).unwrap();
        assert!(candles.is_empty());
    }

    #[test]
    fn test_missing_column() {
        let csv_content = "\
timestamp,open,high,low,close
1704067200000,1,2,0.5,1.5";
        let err = OhlcvCsvParser::load_candles(csv_content.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Missing 'volume' column"));
    }

    #[test]
    fn test_invalid_number() {
        let csv_content = "\
timestamp,open,high,low,close,volume
1704067200000,invalid,2,0.5,1.5,10";
        let err = OhlcvCsvParser::load_candles(csv_content.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Error parsing 'open' at line 2"));
    }

    #[test]
    fn test_missing_file() {
        let err = OhlcvCsvParser::load_candles_from_csv("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
