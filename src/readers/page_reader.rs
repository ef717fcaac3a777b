use crate::error::Result;
use crate::models::RawPage;
use crate::utils::constants::PAGE_SEPARATOR;
use encoding_rs::WINDOWS_1252;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a `pdftotext` dump, one `RawPage` per form-feed separated page.
pub struct PageReader {
    separator: char,
}

impl PageReader {
    pub fn new() -> Self {
        Self {
            separator: PAGE_SEPARATOR,
        }
    }

    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    pub fn read_pages(&self, path: &Path) -> Result<Vec<RawPage>> {
        let bytes = fs::read(path)?;
        let text = decode_text(&bytes);
        let pages = self.split_pages(&text);

        debug!(path = %path.display(), pages = pages.len(), "read page dump");
        Ok(pages)
    }

    /// Split a dump into pages. The empty remainder after a final separator
    /// is not a page.
    pub fn split_pages(&self, text: &str) -> Vec<RawPage> {
        let mut parts: Vec<&str> = text.split(self.separator).collect();
        if parts.len() > 1 && parts.last().is_some_and(|p| p.trim().is_empty()) {
            parts.pop();
        }

        parts
            .into_iter()
            .enumerate()
            .map(|(index, text)| RawPage::new(index, text))
            .collect()
    }
}

impl Default for PageReader {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 when valid, otherwise the Latin-1 superset used by older dumps.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = WINDOWS_1252.decode(bytes);
            if had_errors {
                warn!("page dump contained undecodable bytes");
            }
            text.into_owned()
        }
    }
}
