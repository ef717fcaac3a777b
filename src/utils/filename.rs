use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default output directory with format: output/wx-summary-{YYMMDD}
pub fn generate_default_output_dir() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    let dirname = format!("wx-summary-{:02}{:02}{:02}", year, now.month(), now.day());
    PathBuf::from("output").join(dirname)
}
