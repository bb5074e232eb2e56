//! Tabular export of test-period forecasts.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

use crate::error::{ForecastError, Result};

/// Test-period values to export, one entry per test date.
#[derive(Debug, Clone, Copy)]
pub struct ForecastTable<'a> {
    pub dates: &'a [DateTime<Utc>],
    pub actual: &'a [f64],
    pub sarima: &'a [f64],
    pub lstm: &'a [f64],
    pub ensemble: &'a [f64],
}

impl ForecastTable<'_> {
    fn validate(&self) -> Result<()> {
        let n = self.dates.len();
        for column in [self.actual, self.sarima, self.lstm, self.ensemble] {
            if column.len() != n {
                return Err(ForecastError::DimensionMismatch {
                    expected: n,
                    got: column.len(),
                });
            }
        }
        Ok(())
    }
}

/// Calendar date for midnight timestamps, RFC 3339 otherwise.
fn format_date(ts: &DateTime<Utc>) -> String {
    if ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Write `date,actual,sarima,lstm,ensemble` rows to any writer.
pub fn write_forecasts<W: Write>(writer: W, table: &ForecastTable) -> Result<()> {
    table.validate()?;
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["date", "actual", "sarima", "lstm", "ensemble"])?;
    for i in 0..table.dates.len() {
        csv.write_record([
            format_date(&table.dates[i]),
            table.actual[i].to_string(),
            table.sarima[i].to_string(),
            table.lstm[i].to_string(),
            table.ensemble[i].to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the forecast table to a CSV file at `path`.
pub fn export_forecasts(path: &Path, table: &ForecastTable) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_forecasts(file, table)
}
