pub mod filters;
pub mod record;

pub use filters::{parse_min_score, SampleFilters};
pub use record::{parse_score, Record, Table, TableKind};
