//! Matrix artifacts: date-named CSV and JSON files in the working
//! directory. The JSON file doubles as the snapshot consumed by
//! `--compare` on a later run.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;

use camatrix_domain::{Matrix, MatrixRow};

const ARTIFACT_SUFFIX: &str = "CA-Impact-Matrix";

/// `YYYY-MM-DD-CA-Impact-Matrix.{csv,json}` names for a run date.
pub fn artifact_names(date: NaiveDate) -> (String, String) {
    let stem = format!("{}-{}", date.format("%Y-%m-%d"), ARTIFACT_SUFFIX);
    (format!("{stem}.csv"), format!("{stem}.json"))
}

/// Writes the matrix as CSV: identity columns first, then one column per
/// policy in matrix column order.
pub fn write_csv(path: &Path, matrix: &Matrix) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    let mut header = vec!["user", "upn", "job", "external", "enabled", "userType"];
    header.extend(matrix.policy_names.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in &matrix.rows {
        let mut record = vec![
            row.user.clone(),
            row.upn.clone(),
            row.job.clone(),
            row.external.to_string(),
            row.enabled.to_string(),
            match row.user_type {
                camatrix_domain::UserKind::Member => "member".to_string(),
                camatrix_domain::UserKind::Guest => "guest".to_string(),
            },
        ];
        for policy in &matrix.policy_names {
            record.push(
                row.policies
                    .get(policy)
                    .map(bool::to_string)
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the rows as the JSON snapshot format.
pub fn write_json(path: &Path, rows: &[MatrixRow]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(file, rows)?;
    Ok(())
}

/// Reads a previously exported JSON snapshot for comparison.
pub fn read_snapshot(path: &Path) -> anyhow::Result<Vec<MatrixRow>> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let rows = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a matrix snapshot", path.display()))?;
    Ok(rows)
}
