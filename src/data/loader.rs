//! Load a delimited sales file into a daily aggregated time series.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Columns and dialect of the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Header of the date column.
    pub date_column: String,
    /// Header of the numeric column summed per date.
    pub value_column: String,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            value_column: "sales".to_string(),
            delimiter: b',',
        }
    }
}

impl LoaderConfig {
    /// Set the date column header.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = name.into();
        self
    }

    /// Set the value column header.
    pub fn with_value_column(mut self, name: impl Into<String>) -> Self {
        self.value_column = name.into();
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Read `path` and sum the value column per distinct timestamp.
///
/// The result is sorted by date; dates absent from the file stay absent.
pub fn load_daily_totals(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<TimeSeries> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Io(format!("failed to open '{}': {e}", path.display())))?;
    let series = read_daily_totals(file, config)?;
    info!(
        "loaded {} distinct dates from {}",
        series.len(),
        path.display()
    );
    Ok(series)
}

/// Aggregate records from any reader; see [`load_daily_totals`].
pub fn read_daily_totals<R: Read>(reader: R, config: &LoaderConfig) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, &config.date_column)?;
    let value_idx = column_index(&headers, &config.value_column)?;

    let mut totals: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    let mut rows = 0usize;

    for (idx, record) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = record?;
        rows += 1;

        let raw_date = record.get(date_idx).unwrap_or_default();
        let timestamp = parse_timestamp(raw_date).ok_or_else(|| ForecastError::Parse {
            line,
            message: format!("unparseable date '{raw_date}'"),
        })?;

        let total = totals.entry(timestamp).or_insert(0.0);
        let raw_value = record.get(value_idx).unwrap_or_default();
        if is_missing(raw_value) {
            debug!("line {line}: missing {}, counted as 0", config.value_column);
            continue;
        }
        let value: f64 = raw_value.parse().map_err(|_| ForecastError::Parse {
            line,
            message: format!("non-numeric {} '{raw_value}'", config.value_column),
        })?;
        if value.is_nan() {
            debug!("line {line}: NaN {}, counted as 0", config.value_column);
            continue;
        }

        *total += value;
    }

    if totals.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    debug!("aggregated {rows} rows into {} dates", totals.len());

    let (timestamps, values): (Vec<_>, Vec<_>) = totals.into_iter().unzip();
    Ok(TimeSeries::univariate(timestamps, values)?.with_label(config.value_column.clone()))
}

/// Blank cells and the usual NA markers are missing observations.
fn is_missing(raw: &str) -> bool {
    matches!(raw, "" | "NA" | "N/A" | "null" | "NULL")
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
}

/// Parse a calendar date or date-time; date-only values map to midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn load(csv: &str) -> Result<TimeSeries> {
        read_daily_totals(csv.as_bytes(), &LoaderConfig::default())
    }

    #[test]
    fn sums_sales_per_date_and_sorts() {
        let csv = "date,store,item,sales\n\
                   2013-01-02,1,1,5\n\
                   2013-01-01,1,1,13\n\
                   2013-01-01,2,1,7\n\
                   2013-01-02,2,1,1.5\n";
        let series = load(csv).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.primary_values(), &[20.0, 6.5]);
        assert_eq!(
            series.timestamps()[0],
            Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(series.label(), Some("sales"));
    }

    #[test]
    fn gaps_are_not_filled() {
        let csv = "date,sales\n2020-01-01,1\n2020-01-05,2\n";
        let series = load(csv).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn unparseable_date_is_fatal() {
        let csv = "date,sales\n2020-01-01,1\nnot-a-date,2\n";
        assert!(matches!(
            load(csv),
            Err(ForecastError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn blank_value_adds_nothing_to_its_date() {
        let csv = "date,sales\n2020-01-01,5\n2020-01-01,\n2020-01-02,3\n2020-01-03,NaN\n";
        let series = load(csv).unwrap();
        assert_eq!(series.primary_values(), &[5.0, 3.0, 0.0]);
    }

    #[test]
    fn non_numeric_value_is_fatal() {
        let csv = "date,sales\n2020-01-01,lots\n";
        assert!(matches!(
            load(csv),
            Err(ForecastError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "day,sales\n2020-01-01,1\n";
        assert_eq!(
            load(csv).unwrap_err(),
            ForecastError::MissingColumn("date".to_string())
        );
    }

    #[test]
    fn header_only_is_empty() {
        assert_eq!(load("date,sales\n").unwrap_err(), ForecastError::EmptyData);
    }

    #[test]
    fn custom_columns_and_delimiter() {
        let config = LoaderConfig::default()
            .with_date_column("day")
            .with_value_column("units")
            .with_delimiter(b';');
        let csv = "day;units\n01/31/2021;3\n01/31/2021;4\n";
        let series = read_daily_totals(csv.as_bytes(), &config).unwrap();
        assert_eq!(series.primary_values(), &[7.0]);
        assert_eq!(series.label(), Some("units"));
    }

    #[test]
    fn timestamps_group_by_exact_instant() {
        let csv = "date,sales\n\
                   2020-01-01 10:00:00,1\n\
                   2020-01-01 10:00:00,2\n\
                   2020-01-01T11:00:00,4\n";
        let series = load(csv).unwrap();
        assert_eq!(series.primary_values(), &[3.0, 4.0]);
    }

    #[test]
    fn parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-03-04"), Some(midnight));
        assert_eq!(parse_timestamp("2021/03/04"), Some(midnight));
        assert_eq!(parse_timestamp("03/04/2021"), Some(midnight));
        assert_eq!(parse_timestamp("2021-03-04T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2021-13-40"), None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_daily_totals("/definitely/not/here.csv", &LoaderConfig::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::Io(_)));
    }
}
