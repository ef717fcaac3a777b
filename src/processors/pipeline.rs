use crate::error::{ProcessingError, Result};
use crate::models::{DailyTableBlock, ObservationTable, RawPage, RegionGeometry, StationLocation};
use crate::processors::normalizer::{FormatNormalizer, NormalizedTable};
use crate::processors::region_aggregator::{AggregateOutput, RegionAggregator};
use crate::processors::run_report::{RunReport, SkippedTable};
use crate::processors::segmenter::TableSegmenter;
use crate::processors::station_resolver::{dedupe_locations, Resolution, StationResolver};
use crate::processors::table_parser::TableParser;
use crate::readers::LocationReader;
use crate::settings::Settings;
use crate::utils::progress::ProgressReporter;
use tracing::{info, warn};

/// Raw inputs of one full run.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub pages: Vec<RawPage>,
    pub location_rows: Vec<String>,
    pub regions: Vec<RegionGeometry>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub observations: ObservationTable,
    pub locations: Vec<StationLocation>,
    pub resolution: Resolution,
    pub aggregate: AggregateOutput,
    pub report: RunReport,
}

/// Runs extraction, station resolution and regional aggregation in order.
///
/// A malformed table, location row or region is skipped and recorded in the
/// `RunReport`. Only structural problems abort: a page count that disagrees
/// with `layout.expected_pages`, no daily tables at all, or no table that
/// parses.
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn extract_observations(
        &self,
        pages: &[RawPage],
        report: &mut RunReport,
    ) -> Result<ObservationTable> {
        let layout = &self.settings.layout;
        report.total_pages = pages.len();

        if let Some(expected) = layout.expected_pages {
            if pages.len() != expected {
                return Err(ProcessingError::SourceFormat(format!(
                    "Document has {} pages, expected {}",
                    pages.len(),
                    expected
                )));
            }
        }

        let blocks = TableSegmenter::from_layout(layout).segment(pages);
        report.table_pages = blocks.len();
        if blocks.is_empty() {
            return Err(ProcessingError::SourceFormat(format!(
                "No page contains the table marker '{}'",
                layout.marker
            )));
        }

        if let Some(month) = TableSegmenter::infer_month(&blocks) {
            report.day_count = TableSegmenter::check_day_count(blocks.len(), month);
        }

        let parser = TableParser::new(layout.clone())?;
        let normalizer = FormatNormalizer::new();
        let mut observations = ObservationTable::default();

        for block in &blocks {
            let appended = self
                .normalize_block(&parser, &normalizer, block)
                .and_then(|table| observations.append(&table.measurements, table.rows));

            match appended {
                Ok(()) => report.parsed_tables += 1,
                Err(e) => {
                    warn!(page = block.page_index, error = %e, "skipping daily table");
                    report.skipped_tables.push(SkippedTable {
                        page_index: block.page_index,
                        date_line: block.date_line.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.parsed_tables == 0 {
            return Err(ProcessingError::SourceFormat(format!(
                "None of the {} daily tables could be parsed",
                blocks.len()
            )));
        }

        report.observation_rows = observations.len();
        info!(
            tables = report.parsed_tables,
            skipped = report.skipped_tables.len(),
            rows = observations.len(),
            "extracted observations"
        );
        Ok(observations)
    }

    fn normalize_block(
        &self,
        parser: &TableParser,
        normalizer: &FormatNormalizer,
        block: &DailyTableBlock,
    ) -> Result<NormalizedTable> {
        let wide = parser.parse(&block.text)?;
        normalizer.normalize_block(block, &wide)
    }

    /// Parse location rows and drop coordinate duplicates.
    pub fn prepare_locations(&self, rows: &[String], report: &mut RunReport) -> Vec<StationLocation> {
        let parse = LocationReader::new().parse_rows(rows);
        report.location_rows = rows.len();
        report.rejected_locations = parse.rejected;
        dedupe_locations(&parse.locations)
    }

    pub fn resolve_stations(
        &self,
        observations: &ObservationTable,
        locations: &[StationLocation],
        report: &mut RunReport,
    ) -> Resolution {
        let resolver = StationResolver::new(locations, &self.settings.resolver);
        let resolution = resolver.resolve_all(&observations.station_names());

        report.unresolved_stations = resolution.unresolved_count();
        report.resolved_stations = resolution.stations.len() - report.unresolved_stations;
        report.match_issues = resolution.issues.clone();
        resolution
    }

    pub fn aggregate_regions(
        &self,
        regions: &[RegionGeometry],
        resolution: &Resolution,
        observations: &ObservationTable,
        report: &mut RunReport,
    ) -> Result<AggregateOutput> {
        let aggregator = RegionAggregator::new(self.settings.aggregate.measurement.clone());
        let output = aggregator.aggregate(regions, &resolution.stations, observations)?;

        report.aggregate_rows = output.aggregates.len();
        report.geometry_issues = output.issues.clone();
        Ok(output)
    }

    pub fn run(&self, inputs: PipelineInputs, progress: Option<&ProgressReporter>) -> Result<PipelineOutput> {
        let mut report = RunReport::default();

        if let Some(p) = progress {
            p.stage("Extracting daily tables...");
        }
        let observations = self.extract_observations(&inputs.pages, &mut report)?;

        if let Some(p) = progress {
            p.stage("Resolving station locations...");
        }
        let locations = self.prepare_locations(&inputs.location_rows, &mut report);
        let resolution = self.resolve_stations(&observations, &locations, &mut report);

        if let Some(p) = progress {
            p.stage("Aggregating regions...");
        }
        let aggregate = self.aggregate_regions(&inputs.regions, &resolution, &observations, &mut report)?;

        if let Some(p) = progress {
            p.finish_with_message("Processing complete");
        }

        Ok(PipelineOutput {
            observations,
            locations,
            resolution,
            aggregate,
            report,
        })
    }
}
