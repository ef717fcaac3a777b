use crate::error::{ProcessingError, Result};
use crate::models::TimeSlot;
use crate::settings::TableLayout;
use crate::utils::constants::SLOT_SEPARATOR;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Fields are separated by two or more whitespace characters; single spaces
/// belong to the field (e.g. `WIND DIR`, `Filton and Almondsbury`).
static FIELD_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("field break pattern is valid"));

/// Rectangular grid of string cells with named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub id_columns: usize,
    pub rows: Vec<Vec<String>>,
}

impl WideTable {
    pub fn measurement_columns(&self) -> &[String] {
        &self.columns[self.id_columns..]
    }
}

/// Turns one daily table block into a `WideTable` using a fixed layout.
///
/// A header or data line wider than the layout is a changed source format
/// and rejects the table.
pub struct TableParser {
    layout: TableLayout,
}

impl TableParser {
    pub fn new(layout: TableLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn parse(&self, text: &str) -> Result<WideTable> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

        let header = lines.get(self.layout.header_line).ok_or_else(|| {
            ProcessingError::SourceFormat(format!(
                "Table has {} non-blank lines, header expected on line {}",
                lines.len(),
                self.layout.header_line
            ))
        })?;
        let columns = self.column_names(header)?;

        let data_end = lines.len().saturating_sub(self.layout.skip_tail);
        let data_lines = lines.get(self.layout.skip_head..data_end).unwrap_or(&[]);

        if data_lines.len() < self.layout.min_stations {
            return Err(ProcessingError::SourceFormat(format!(
                "Only {} data lines found, at least {} stations expected",
                data_lines.len(),
                self.layout.min_stations
            )));
        }

        let rows = data_lines
            .iter()
            .map(|line| self.data_fields(line))
            .collect::<Result<Vec<_>>>()?;

        debug!(columns = columns.len(), rows = rows.len(), "parsed table block");

        Ok(WideTable {
            columns,
            id_columns: self.layout.id_columns,
            rows,
        })
    }

    fn data_fields(&self, line: &str) -> Result<Vec<String>> {
        let found = FIELD_BREAK.split(line.trim()).count();
        if found > self.layout.column_count {
            return Err(ProcessingError::SourceFormat(format!(
                "Data line has {} fields, layout allows {}: '{}'",
                found,
                self.layout.column_count,
                line.trim()
            )));
        }
        Ok(split_fields(line, self.layout.column_count))
    }

    /// Identifier names as-is, then each measurement name suffixed once per
    /// time slot: all `_0000` columns first, then all `_1200` columns.
    fn column_names(&self, header: &str) -> Result<Vec<String>> {
        let names: Vec<&str> = FIELD_BREAK
            .split(header.trim())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        let measurement_count = self.layout.measurement_count();
        let needed = self.layout.id_columns + measurement_count;
        if names.len() != needed {
            return Err(ProcessingError::SourceFormat(format!(
                "Header '{}' has {} column names, layout expects {}",
                header.trim(),
                names.len(),
                needed
            )));
        }

        let measurements = &names[self.layout.id_columns..needed];
        let mut columns: Vec<String> = names[..self.layout.id_columns]
            .iter()
            .map(|n| n.to_string())
            .collect();

        for slot in TimeSlot::ALL {
            columns.extend(
                measurements
                    .iter()
                    .map(|m| format!("{}{}{}", m, SLOT_SEPARATOR, slot.as_str())),
            );
        }

        Ok(columns)
    }
}

/// Split a line into exactly `column_count` fields, right-padding with empty
/// strings and dropping any surplus.
pub fn split_fields(line: &str, column_count: usize) -> Vec<String> {
    let trimmed = line.trim();
    let mut fields: Vec<String> = if trimmed.is_empty() {
        Vec::new()
    } else {
        FIELD_BREAK.split(trimmed).map(|f| f.to_string()).collect()
    };

    fields.resize(column_count, String::new());
    fields
}
