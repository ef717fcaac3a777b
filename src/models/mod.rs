pub mod observation;
pub mod page;
pub mod region;
pub mod station;

pub use observation::{ObservationTable, StationObservation, TimeSlot};
pub use page::{DailyTableBlock, RawPage};
pub use region::{RegionDailyAggregate, RegionGeometry};
pub use station::{MatchTier, ResolvedStation, StationLocation};
