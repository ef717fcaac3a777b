pub mod normalizer;
pub mod pipeline;
pub mod region_aggregator;
pub mod run_report;
pub mod segmenter;
pub mod station_resolver;
pub mod table_parser;

pub use normalizer::{FormatNormalizer, LongRecord, NormalizedTable};
pub use pipeline::{Pipeline, PipelineInputs, PipelineOutput};
pub use region_aggregator::{AggregateOutput, GeometryIssue, RegionAggregator, RegionAssignment};
pub use run_report::{RunReport, SkippedTable};
pub use segmenter::{DayCountMismatch, TableSegmenter};
pub use station_resolver::{MatchIssue, MatchIssueKind, Resolution, StationResolver};
pub use table_parser::{TableParser, WideTable};
