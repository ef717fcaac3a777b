use serde::{Deserialize, Serialize};

/// Plain text of a single page of the summary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPage {
    pub page_index: usize,
    pub text: String,
}

impl RawPage {
    pub fn new(page_index: usize, text: impl Into<String>) -> Self {
        Self {
            page_index,
            text: text.into(),
        }
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }
}

/// One daily table page, selected by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTableBlock {
    pub page_index: usize,
    pub text: String,
    /// Line carrying the table date, e.g. `Daily Weather Summary for 1 January 2020`.
    pub date_line: Option<String>,
}

impl DailyTableBlock {
    pub fn new(page_index: usize, text: String, date_line: Option<String>) -> Self {
        Self {
            page_index,
            text,
            date_line,
        }
    }
}
