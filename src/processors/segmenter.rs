use crate::models::{DailyTableBlock, RawPage};
use crate::settings::TableLayout;
use crate::utils::dates::{days_in_month, find_date_line, parse_summary_date};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use tracing::{debug, warn};

/// Table count that disagrees with the length of the source month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCountMismatch {
    pub year: i32,
    pub month: u32,
    pub expected: u32,
    pub found: usize,
}

impl fmt::Display for DayCountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {} daily tables for {:04}-{:02}, expected {}",
            self.found, self.year, self.month, self.expected
        )
    }
}

/// Selects the pages that hold a daily station table.
pub struct TableSegmenter {
    marker: String,
}

impl TableSegmenter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn from_layout(layout: &TableLayout) -> Self {
        Self::new(layout.marker.clone())
    }

    /// Pages containing the marker phrase, in their original order.
    pub fn segment(&self, pages: &[RawPage]) -> Vec<DailyTableBlock> {
        self.segment_with(pages, |page| page.contains(&self.marker))
    }

    pub fn segment_with<F>(&self, pages: &[RawPage], predicate: F) -> Vec<DailyTableBlock>
    where
        F: Fn(&RawPage) -> bool,
    {
        let blocks: Vec<DailyTableBlock> = pages
            .iter()
            .filter(|page| predicate(page))
            .map(|page| {
                DailyTableBlock::new(
                    page.page_index,
                    page.text.clone(),
                    find_date_line(&page.text).map(str::to_string),
                )
            })
            .collect();

        debug!(pages = pages.len(), tables = blocks.len(), "segmented page dump");
        blocks
    }

    /// Month of the first block whose date line parses.
    pub fn infer_month(blocks: &[DailyTableBlock]) -> Option<NaiveDate> {
        blocks
            .iter()
            .filter_map(|b| b.date_line.as_deref())
            .find_map(|line| parse_summary_date(line).ok())
            .and_then(|date| date.with_day(1))
    }

    pub fn check_day_count(found: usize, month: NaiveDate) -> Option<DayCountMismatch> {
        let expected = days_in_month(month.year(), month.month())?;
        if found as u32 == expected {
            return None;
        }

        let mismatch = DayCountMismatch {
            year: month.year(),
            month: month.month(),
            expected,
            found,
        };
        warn!(%mismatch, "daily table count does not match the month");
        Some(mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Selected UK readings at";

    fn table_page(index: usize, day: u32) -> RawPage {
        RawPage::new(
            index,
            format!(
                "{} (L) 0000 and (R) 1200 UTC\nDaily Weather Summary for {} February 2020\nNO  SITE",
                MARKER, day
            ),
        )
    }

    fn month_of_pages(days: u32) -> Vec<RawPage> {
        let mut pages = vec![RawPage::new(0, "Cover page")];
        for day in 1..=days {
            pages.push(table_page(pages.len(), day));
            pages.push(RawPage::new(pages.len(), "Synoptic chart"));
        }
        pages
    }

    #[test]
    fn test_segment_preserves_order() {
        let pages = month_of_pages(3);
        let blocks = TableSegmenter::new(MARKER).segment(&pages);

        let indices: Vec<usize> = blocks.iter().map(|b| b.page_index).collect();
        assert_eq!(indices, vec![1, 3, 5]);
        assert_eq!(
            blocks[2].date_line.as_deref(),
            Some("Daily Weather Summary for 3 February 2020")
        );
    }

    #[test]
    fn test_segment_does_not_mutate_input() {
        let pages = month_of_pages(2);
        let before = pages.clone();
        let _ = TableSegmenter::new(MARKER).segment(&pages);
        assert_eq!(pages, before);
    }

    #[test]
    fn test_full_month_matches_day_count() {
        let pages = month_of_pages(29);
        let blocks = TableSegmenter::new(MARKER).segment(&pages);
        let month = TableSegmenter::infer_month(&blocks).unwrap();

        assert_eq!(month, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(blocks.len(), 29);
        assert!(TableSegmenter::check_day_count(blocks.len(), month).is_none());
    }

    #[test]
    fn test_short_month_is_reported() {
        let pages = month_of_pages(27);
        let blocks = TableSegmenter::new(MARKER).segment(&pages);
        let month = TableSegmenter::infer_month(&blocks).unwrap();

        let mismatch = TableSegmenter::check_day_count(blocks.len(), month).unwrap();
        assert_eq!(mismatch.expected, 29);
        assert_eq!(mismatch.found, 27);
        assert_eq!(blocks.len(), 27);
    }

    #[test]
    fn test_custom_predicate() {
        let pages = month_of_pages(2);
        let blocks = TableSegmenter::new(MARKER)
            .segment_with(&pages, |page| page.text.contains("Synoptic"));
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.date_line.is_none()));
    }
}
