use crate::processors::region_aggregator::GeometryIssue;
use crate::processors::segmenter::DayCountMismatch;
use crate::processors::station_resolver::MatchIssue;
use crate::readers::RejectedRow;

/// A daily table that was skipped and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTable {
    pub page_index: usize,
    pub date_line: Option<String>,
    pub reason: String,
}

/// Everything skipped, ambiguous or undefined during one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total_pages: usize,
    pub table_pages: usize,
    pub parsed_tables: usize,
    pub observation_rows: usize,
    pub skipped_tables: Vec<SkippedTable>,
    pub day_count: Option<DayCountMismatch>,
    pub location_rows: usize,
    pub rejected_locations: Vec<RejectedRow>,
    pub resolved_stations: usize,
    pub unresolved_stations: usize,
    pub match_issues: Vec<MatchIssue>,
    pub aggregate_rows: usize,
    pub geometry_issues: Vec<GeometryIssue>,
}

impl RunReport {
    pub fn issue_count(&self) -> usize {
        self.skipped_tables.len()
            + usize::from(self.day_count.is_some())
            + self.rejected_locations.len()
            + self.match_issues.len()
            + self.geometry_issues.len()
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Run Report ===\n");
        summary.push_str(&format!(
            "Pages: {} ({} daily tables, {} parsed)\n",
            self.total_pages, self.table_pages, self.parsed_tables
        ));
        summary.push_str(&format!("Observation rows: {}\n", self.observation_rows));
        summary.push_str(&format!(
            "Location rows: {} ({} rejected)\n",
            self.location_rows,
            self.rejected_locations.len()
        ));
        summary.push_str(&format!(
            "Stations: {} resolved, {} unresolved\n",
            self.resolved_stations, self.unresolved_stations
        ));
        summary.push_str(&format!("Region-day rows: {}\n", self.aggregate_rows));

        if let Some(mismatch) = &self.day_count {
            summary.push_str(&format!("\nDay count warning: {}\n", mismatch));
        }

        if !self.skipped_tables.is_empty() {
            summary.push_str(&format!("\nSkipped tables: {}\n", self.skipped_tables.len()));
            for skipped in &self.skipped_tables {
                summary.push_str(&format!(
                    "  page {} ({}): {}\n",
                    skipped.page_index,
                    skipped.date_line.as_deref().unwrap_or("no date line"),
                    skipped.reason
                ));
            }
        }

        if !self.rejected_locations.is_empty() {
            summary.push_str(&format!(
                "\nRejected location rows: {}\n",
                self.rejected_locations.len()
            ));
            for rejected in &self.rejected_locations {
                summary.push_str(&format!("  row {}: {}\n", rejected.row_index, rejected.reason));
            }
        }

        if !self.match_issues.is_empty() {
            summary.push_str(&format!("\nStation match issues: {}\n", self.match_issues.len()));
            for issue in &self.match_issues {
                summary.push_str(&format!("  {}\n", issue));
            }
        }

        if !self.geometry_issues.is_empty() {
            summary.push_str(&format!("\nRegion issues: {}\n", self.geometry_issues.len()));
            for issue in &self.geometry_issues {
                summary.push_str(&format!("  {}\n", issue));
            }
        }

        summary
    }
}
