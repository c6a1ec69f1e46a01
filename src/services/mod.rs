pub mod engine;
pub mod sampler;

pub use engine::{candidates, distinct_categories, distinct_tags, pick, sample_one, QueryError};
pub use sampler::RandomSource;
