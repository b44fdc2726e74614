//! Error taxonomy for the itinerary optimizer.
//!
//! Provider-level failures (`SourceError`) never escape an optimization
//! call: they degrade to the geometric estimator and show up only as the
//! `Estimated` flag on the resulting records. Everything in `PlanError`
//! is surfaced to the caller.

use std::time::Duration;

/// Failures of an external travel-time source lookup.
///
/// These are recoverable by design: the provider falls back to the
/// haversine estimator whenever a lookup fails.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service rejected the request: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    BadResponse(String),
}

/// Failures surfaced to the caller of an optimization.
///
/// Infeasibility is deliberately *not* an error: a route that schedules
/// zero places comes back as a `RouteResult` with `feasible == false`
/// and per-place skip reasons.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Coordinates outside [-90, 90] x [-180, 180] (or non-finite).
    /// Never silently mapped to zero distance.
    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    /// Malformed scheduling preferences (zero budget, bad weights).
    #[error("invalid preferences: {0}")]
    InvalidPreferences(String),

    /// No candidate places were supplied.
    #[error("no candidate places to plan")]
    NoCandidates,

    /// Wall-clock budget for the whole optimization was exceeded.
    /// No partial result accompanies this.
    #[error("optimization timed out after {elapsed:?}")]
    OptimizationTimeout { elapsed: Duration },

    /// Systemic failure building the pairwise matrix.
    #[error("failed to build travel matrix")]
    MatrixBuildFailure(#[source] Box<PlanError>),
}
