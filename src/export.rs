use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One series' share of a measurement-history row. Empty statistics (e.g.
/// a measurement taken while that series had no frame on screen) stay
/// blank in the export.
#[derive(Debug, Clone, Default)]
pub struct RoiRecord {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub info: String,
}

impl RoiRecord {
    pub fn new(mean: f64, std: f64, info: impl Into<String>) -> Self {
        Self {
            mean: Some(mean),
            std: Some(std),
            info: info.into(),
        }
    }
}

const SUMMARY_DECIMALS: i32 = 4;

/// Write the measurement history as a CSV spreadsheet named
/// `ROI-history-{timestamp}.csv` under `out_dir`.
///
/// Columns are `No.` followed by Mean / Std Dev / Info per series. After
/// the data rows come two blank rows, a header without the Info columns,
/// and a row of per-column averages of the recorded means and stds.
pub fn export_history(
    out_dir: &Path,
    history: &[Vec<RoiRecord>],
    series_count: usize,
) -> Result<PathBuf, ExportError> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = out_dir.join(format!("ROI-history-{timestamp}.csv"));
    // The summary rows drop the Info columns, so record lengths vary.
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;

    let mut header = vec!["No.".to_string()];
    for series in 0..series_count {
        header.push(format!("Folder{} Mean", series + 1));
        header.push(format!("Folder{} Std Dev", series + 1));
        header.push(format!("Folder{} Info", series + 1));
    }
    writer.write_record(&header)?;

    for (row_index, row) in history.iter().enumerate() {
        let mut cells = vec![(row_index + 1).to_string()];
        for series in 0..series_count {
            let record = row.get(series).cloned().unwrap_or_default();
            cells.push(record.mean.map(|v| v.to_string()).unwrap_or_default());
            cells.push(record.std.map(|v| v.to_string()).unwrap_or_default());
            cells.push(record.info);
        }
        writer.write_record(&cells)?;
    }

    let blank = vec![""; header.len()];
    writer.write_record(&blank)?;
    writer.write_record(&blank)?;

    let mut summary_header = vec!["No.".to_string()];
    let mut summary_values = vec![String::new()];
    for series in 0..series_count {
        summary_header.push(format!("Folder{} Mean", series + 1));
        summary_header.push(format!("Folder{} Std Dev", series + 1));
        summary_values.push(column_average(
            history
                .iter()
                .filter_map(|row| row.get(series).and_then(|record| record.mean)),
        ));
        summary_values.push(column_average(
            history
                .iter()
                .filter_map(|row| row.get(series).and_then(|record| record.std)),
        ));
    }
    writer.write_record(&summary_header)?;
    writer.write_record(&summary_values)?;
    writer.flush()?;

    info!(
        "exported {} history rows to {}",
        history.len(),
        path.display()
    );
    Ok(path)
}

/// Average of the recorded values, rounded to 4 decimals; blank when the
/// column has no values.
fn column_average(values: impl Iterator<Item = f64>) -> String {
    let mut sum = 0_f64;
    let mut count = 0_usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        return String::new();
    }
    let factor = 10_f64.powi(SUMMARY_DECIMALS);
    ((sum / count as f64 * factor).round() / factor).to_string()
}
