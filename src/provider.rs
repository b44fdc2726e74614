//! Travel-time provider: cache in front, external source behind it,
//! geometric estimator as the safety net.
//!
//! Matrix construction is the one concurrency-sensitive operation in
//! the crate: off-diagonal pairs are looked up in small rayon batches
//! with a delay between batches so an external service's rate limits
//! are respected.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use tracing::debug;

use crate::cache::DistanceCache;
use crate::deadline::Deadline;
use crate::error::PlanError;
use crate::estimator::GeoEstimator;
use crate::model::{Coordinates, DistanceRecord};
use crate::osrm::OsrmClient;
use crate::traits::TravelTimeSource;

/// Batching knobs for matrix construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Lookups issued concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches when an external source is configured.
    pub batch_delay: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(200),
        }
    }
}

/// Pairwise n x n travel matrix. Diagonal entries are zero by
/// definition and are never queried.
#[derive(Debug, Clone)]
pub struct TravelMatrix {
    n: usize,
    records: Vec<DistanceRecord>,
}

impl TravelMatrix {
    /// Builds a matrix from a closure, mostly useful for callers that
    /// already hold precomputed pairwise data. The diagonal is forced
    /// to zero.
    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> DistanceRecord) -> Self {
        let mut records = vec![DistanceRecord::zero(); n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    records[i * n + j] = f(i, j);
                }
            }
        }
        Self { n, records }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, from: usize, to: usize) -> DistanceRecord {
        self.records[from * self.n + to]
    }

    /// Total travel duration along an ordering of matrix indices.
    pub fn route_duration_min(&self, order: &[usize]) -> f64 {
        order
            .windows(2)
            .map(|leg| self.get(leg[0], leg[1]).duration_min)
            .sum()
    }
}

/// Distance/duration lookup with caching and graceful degradation.
///
/// `source == None` models the unconfigured case (no credentials / no
/// service endpoint): every lookup resolves through the estimator.
#[derive(Debug)]
pub struct TravelTimeProvider<S = OsrmClient> {
    source: Option<S>,
    estimator: GeoEstimator,
    cache: Arc<DistanceCache>,
    config: ProviderConfig,
}

impl TravelTimeProvider<OsrmClient> {
    /// Provider with no external source; everything is estimated.
    pub fn offline(cache: Arc<DistanceCache>) -> Self {
        Self::new(None, cache)
    }
}

impl<S: TravelTimeSource> TravelTimeProvider<S> {
    pub fn new(source: Option<S>, cache: Arc<DistanceCache>) -> Self {
        Self {
            source,
            estimator: GeoEstimator::default(),
            cache,
            config: ProviderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_estimator(mut self, estimator: GeoEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn cache(&self) -> &DistanceCache {
        &self.cache
    }

    /// Directed lookup. Invalid coordinates fail fast; source failures
    /// degrade to the estimator and flag the record. Every outcome is
    /// cached.
    pub fn lookup(&self, from: Coordinates, to: Coordinates) -> Result<DistanceRecord, PlanError> {
        from.validate()?;
        to.validate()?;

        let key = DistanceCache::key(from, to);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let record = self.resolve(from, to);
        self.cache.insert(key, record);
        Ok(record)
    }

    fn resolve(&self, from: Coordinates, to: Coordinates) -> DistanceRecord {
        match &self.source {
            Some(source) => match source.lookup(from, to) {
                Ok(record) => record,
                Err(err) => {
                    debug!(error = %err, "source lookup failed, falling back to estimator");
                    self.estimator.estimate(from, to)
                }
            },
            None => self.estimator.estimate(from, to),
        }
    }

    /// Builds the full pairwise matrix. Both directions of every pair
    /// are queried. Any hard lookup error aborts the build; no partial
    /// matrix escapes. The deadline is consulted before each batch so a
    /// slow source cannot run long past the caller's timeout.
    pub fn matrix_for(
        &self,
        coords: &[Coordinates],
        deadline: Deadline,
    ) -> Result<TravelMatrix, PlanError> {
        let n = coords.len();
        let mut records = vec![DistanceRecord::zero(); n * n];

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect();

        let batch_size = self.config.batch_size.max(1);
        let batches = pairs.chunks(batch_size).collect::<Vec<_>>();
        let last_batch = batches.len().saturating_sub(1);

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            deadline.check()?;

            let resolved = batch
                .par_iter()
                .map(|&(i, j)| self.lookup(coords[i], coords[j]).map(|record| (i, j, record)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| PlanError::MatrixBuildFailure(Box::new(err)))?;

            for (i, j, record) in resolved {
                records[i * n + j] = record;
            }

            if self.source.is_some() && batch_idx < last_batch && !self.config.batch_delay.is_zero()
            {
                thread::sleep(self.config.batch_delay);
            }
        }

        debug!(places = n, lookups = pairs.len(), "travel matrix built");
        Ok(TravelMatrix { n, records })
    }
}
