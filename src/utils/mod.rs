pub mod constants;
pub mod coordinates;
pub mod dates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{dms_to_decimal, haversine_distance, parse_coordinate_pair};
pub use dates::{days_in_month, find_date_line, parse_summary_date};
pub use filename::generate_default_output_dir;
pub use progress::ProgressReporter;
