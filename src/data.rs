//! Bar source
//!
//! Loads OHLCV bars from CSV files with a `datetime,open,high,low,close,volume`
//! header. Invalid bars are skipped with a warning; timestamps that do not
//! strictly increase abort the load.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{info, warn};

use crate::types::Bar;

/// Load OHLCV bars from a CSV file with validation
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut bars: Vec<Bar> = Vec::new();
    let mut invalid_count = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let timestamp = parse_date(dt_str)?;

        let field = |idx: usize, name: &str| -> Result<f64> {
            record
                .get(idx)
                .with_context(|| format!("Missing {} column", name))?
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse {} at row {}", name, row_idx + 1))
        };

        let open = field(1, "open")?;
        let high = field(2, "high")?;
        let low = field(3, "low")?;
        let close = field(4, "close")?;
        let volume = field(5, "volume")?;

        match Bar::new(timestamp, open, high, low, close, volume) {
            Ok(bar) => {
                if let Some(last) = bars.last() {
                    if bar.timestamp <= last.timestamp {
                        anyhow::bail!(
                            "Bars out of order at row {}: {} does not follow {}",
                            row_idx + 2,
                            bar.timestamp,
                            last.timestamp
                        );
                    }
                }
                bars.push(bar);
            }
            Err(e) => {
                invalid_count += 1;
                warn!(
                    "Skipping invalid bar at row {} in {:?}: {}",
                    row_idx + 2, // +2 for 1-indexed and header row
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if invalid_count > 0 {
        warn!(
            "Skipped {} invalid bars out of {} in {:?}",
            invalid_count,
            invalid_count + bars.len(),
            path.file_name().unwrap_or_default()
        );
    }

    info!("Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

/// Parse a date string to `DateTime<Utc>`.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM` and
/// `YYYY-MM-DD` (start of day).
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let date_str = date_str.trim();

    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    if let Ok(nd) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    anyhow::bail!(
        "Failed to parse date: {}. Use YYYY-MM-DD, YYYY-MM-DD HH:MM or YYYY-MM-DD HH:MM:SS format",
        date_str
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "triple_reversal_{}_{}.csv",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let path = write_temp(
            "load",
            "datetime,open,high,low,close,volume\n\
             2017-01-02 00:00:00,100,105,95,102,1000\n\
             2017-01-03,102,106,101,105,1200\n\
             2017-01-04T00:00:00Z,105,107,104,106,900\n",
        );
        let bars = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].close, 105.0);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn test_invalid_bars_skipped() {
        let path = write_temp(
            "invalid",
            "datetime,open,high,low,close,volume\n\
             2017-01-02,100,105,95,102,1000\n\
             2017-01-03,100,90,95,92,1000\n\
             2017-01-04,NaN,NaN,NaN,NaN,1\n\
             2017-01-05,105,107,104,106,900\n",
        );
        let bars = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.close.is_finite()));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let path = write_temp(
            "order",
            "datetime,open,high,low,close,volume\n\
             2017-01-03,100,105,95,102,1000\n\
             2017-01-02,102,106,101,105,1200\n",
        );
        let result = load_csv(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let a = parse_date("2017-06-15").unwrap();
        let b = parse_date("2017-06-15 00:00").unwrap();
        let c = parse_date("2017-06-15 00:00:00").unwrap();
        let d = parse_date("2017-06-15T00:00:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, d);
        assert!(parse_date("15/06/2017").is_err());
    }
}
