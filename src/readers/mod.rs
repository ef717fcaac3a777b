pub mod location_fetcher;
pub mod location_reader;
pub mod page_reader;
pub mod region_reader;

pub use location_fetcher::{extract_table_rows, LocationFetcher};
pub use location_reader::{LocationParse, LocationReader, RejectedRow};
pub use page_reader::PageReader;
pub use region_reader::RegionReader;
