//! Cooperative wall-clock deadline for a whole optimization call.
//!
//! Checked between phases, between matrix batches and inside the hot
//! loops. No partial result survives a timeout.

use std::time::{Duration, Instant};

use crate::error::PlanError;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn check(&self) -> Result<(), PlanError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.limit {
            Err(PlanError::OptimizationTimeout { elapsed })
        } else {
            Ok(())
        }
    }
}
