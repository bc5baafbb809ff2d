//! Output file naming.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Sub-directory, beside the redline, for the cleaned redline.
pub const EDITS_DIR: &str = "edits";
/// Suffix appended to the redline's file stem.
pub const PREPROCESS_SUFFIX: &str = "_PREPROCESS";
/// Timestamp layout in running-output file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Where the cleaned redline is saved: `<dir>/edits/<stem>_PREPROCESS.png`.
#[must_use]
pub fn preprocessed_redline_path(redline: &Path) -> PathBuf {
    let dir = redline.parent().unwrap_or_else(|| Path::new(""));
    let stem = redline
        .file_stem()
        .map_or_else(|| "redline".into(), |s| s.to_string_lossy());
    dir.join(EDITS_DIR)
        .join(format!("{stem}{PREPROCESS_SUFFIX}.png"))
}

/// Where the annotated running image is saved:
/// `<out_dir>/<JOB>_<YYYYmmddTHHMMSS>.png`.
#[must_use]
pub fn running_output_path(out_dir: &Path, job: &str, at: NaiveDateTime) -> PathBuf {
    out_dir.join(format!("{job}_{}.png", at.format(TIMESTAMP_FORMAT)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn preprocessed_goes_into_edits() {
        assert_eq!(
            preprocessed_redline_path(Path::new("/scans/job/DYEA_LSA_12.png")),
            PathBuf::from("/scans/job/edits/DYEA_LSA_12_PREPROCESS.png")
        );
        assert_eq!(
            preprocessed_redline_path(Path::new("red.png")),
            PathBuf::from("edits/red_PREPROCESS.png")
        );
    }

    #[test]
    fn running_output_is_timestamped() {
        let at = NaiveDate::from_ymd_opt(2024, 4, 15)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap();
        assert_eq!(
            running_output_path(Path::new("out"), "VZ_LAN_0042", at),
            PathBuf::from("out/VZ_LAN_0042_20240415T090530.png")
        );
    }
}
