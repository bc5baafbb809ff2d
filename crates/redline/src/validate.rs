//! Input validation for a transfer job.

use std::path::Path;

use chrono::NaiveDate;
use redline_pipeline::production::Category;

use crate::error::CliError;

/// Known programs as (client, program) job-number prefixes.
pub const PROGRAMS: [(&str, &str); 2] = [("DYEA", "LSA"), ("VZ", "LAN")];

/// Work-performed date layout.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// The path exists and is a `.png`.
pub fn png_input(role: &'static str, path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::MissingFile {
            role,
            path: path.to_path_buf(),
        });
    }
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        return Err(CliError::NotPng {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Upper-case the job number and check its program prefix.
///
/// Either of the first two `_`-separated segments matching a known
/// program is enough.
pub fn job_number(raw: &str) -> Result<String, CliError> {
    let number = raw.trim().to_ascii_uppercase();
    let mut segments = number.split('_');
    match (segments.next(), segments.next()) {
        (Some(client), Some(program))
            if PROGRAMS
                .iter()
                .any(|(c, p)| client == *c || program == *p) =>
        {
            Ok(number)
        }
        _ => Err(CliError::InvalidJob(raw.to_string())),
    }
}

/// Check a strict `MM/DD/YYYY` date and return it as entered.
///
/// Month and day need their leading zero, so the date must format back
/// to exactly the same text.
pub fn work_date(raw: &str) -> Result<String, CliError> {
    let date = raw.trim();
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .filter(|d| d.format(DATE_FORMAT).to_string() == date)
        .map(|_| date.to_string())
        .ok_or_else(|| CliError::InvalidDate(raw.to_string()))
}

/// Quantities must be finite and non-negative.
pub fn quantity(category: Category, value: f64) -> Result<f64, CliError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CliError::InvalidQuantity {
            code: category.code(),
            value,
        })
    }
}
