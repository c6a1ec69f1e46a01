use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::models::{Record, SampleFilters, Table};

use super::engine;

/// Random source used by request handlers to sample records
///
/// `ThreadLocal` draws from the per-thread generator, so concurrent requests
/// never share generator state. `Seeded` shares one deterministic generator
/// between all requests, which makes picks reproducible for tests and demos.
#[derive(Clone, Debug, Default)]
pub enum RandomSource {
    #[default]
    ThreadLocal,
    Seeded(Arc<Mutex<StdRng>>),
}

impl RandomSource {
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    /// Samples one record matching `filters`, see [`engine::sample_one`].
    ///
    /// The table scan runs outside any lock; a seeded source holds its mutex
    /// only for the final choice.
    pub fn sample<'t>(&self, table: &'t Table, filters: &SampleFilters) -> Option<&'t Record> {
        let candidates = engine::candidates(table, filters);
        if candidates.is_empty() {
            return None;
        }

        match self {
            RandomSource::ThreadLocal => engine::pick(&candidates, &mut rand::thread_rng()),
            RandomSource::Seeded(rng) => {
                // A panic while holding the lock cannot leave the generator
                // in an invalid state
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                engine::pick(&candidates, &mut *rng)
            }
        }
    }
}
