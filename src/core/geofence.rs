//! Authorized-location check.
//!
//! Resolution order for the reference point: the worker's own site, then the
//! office of the worker's regional, then unrestricted. The distance check is a
//! pure function; the validator only adds the deadline around the lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::errors::{AppResult, PunchError};
use crate::models::coordinate::Coordinate;
use crate::models::worker::{RegionalSite, WorkSite};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceSource {
    WorkSite,
    Regional,
}

/// The authoritative point a punch is measured against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub point: Coordinate,
    pub name: String,
    pub tolerance_m: f64,
    pub source: ReferenceSource,
}

/// Tolerances applied during resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofencePolicy {
    /// Radius for regional offices (and work sites stored without one).
    pub default_tolerance_m: f64,
    /// Minimum radius for "visita" workers.
    pub visitor_tolerance_m: f64,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            default_tolerance_m: 50.0,
            visitor_tolerance_m: 1000.0,
        }
    }
}

/// Outcome of one geofence evaluation. Always the same shape, whatever the
/// punch type; what to do with a failure is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceCheck {
    pub valid: bool,
    pub distance_m: f64,
    pub tolerance_m: f64,
    pub reference: Option<String>,
    pub timed_out: bool,
}

impl GeofenceCheck {
    pub fn unrestricted() -> Self {
        Self {
            valid: true,
            distance_m: 0.0,
            tolerance_m: 0.0,
            reference: None,
            timed_out: false,
        }
    }

    /// The lookup did not answer in time. Never treated as unrestricted.
    pub fn unavailable() -> Self {
        Self {
            valid: false,
            distance_m: 0.0,
            tolerance_m: 0.0,
            reference: None,
            timed_out: true,
        }
    }

    /// Domain error for a failed check, `None` when it passed.
    pub fn violation(&self) -> Option<PunchError> {
        if self.valid {
            None
        } else if self.timed_out {
            Some(PunchError::GeofenceUnavailable)
        } else {
            Some(PunchError::GeofenceViolation {
                distance_m: self.distance_m,
                tolerance_m: self.tolerance_m,
                reference: self.reference.clone().unwrap_or_default(),
            })
        }
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Picks the reference point for a worker.
pub fn resolve_reference(
    site: Option<&WorkSite>,
    regional: Option<&RegionalSite>,
    is_visitor: bool,
    policy: &GeofencePolicy,
) -> Option<ReferencePoint> {
    let mut reference = if let Some(s) = site {
        let tolerance_m = if s.tolerance_m > 0.0 {
            s.tolerance_m
        } else {
            policy.default_tolerance_m
        };
        ReferencePoint {
            point: s.point,
            name: s.name.clone(),
            tolerance_m,
            source: ReferenceSource::WorkSite,
        }
    } else {
        let r = regional?;
        ReferencePoint {
            point: r.point?,
            name: r.name.clone(),
            tolerance_m: policy.default_tolerance_m,
            source: ReferenceSource::Regional,
        }
    };

    if is_visitor {
        reference.tolerance_m = reference.tolerance_m.max(policy.visitor_tolerance_m);
    }
    Some(reference)
}

/// Measures `at` against an already-resolved reference.
pub fn check(at: Coordinate, reference: Option<&ReferencePoint>) -> GeofenceCheck {
    let Some(r) = reference else {
        return GeofenceCheck::unrestricted();
    };
    let distance_m = haversine_m(at, r.point);
    GeofenceCheck {
        valid: distance_m <= r.tolerance_m,
        distance_m,
        tolerance_m: r.tolerance_m,
        reference: Some(r.name.clone()),
        timed_out: false,
    }
}

/// Location/Regional collaborator.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_reference_point(&self, worker_id: i64) -> AppResult<Option<ReferencePoint>>;
}

pub struct GeofenceValidator {
    resolver: Arc<dyn LocationResolver>,
    deadline: Duration,
}

impl GeofenceValidator {
    pub fn new(resolver: Arc<dyn LocationResolver>, deadline: Duration) -> Self {
        Self { resolver, deadline }
    }

    /// Resolves the worker's reference and measures `at` against it. A lookup
    /// that errors or misses the deadline yields a failed check.
    pub async fn validate(&self, worker_id: i64, at: Coordinate) -> GeofenceCheck {
        match tokio::time::timeout(self.deadline, self.resolver.resolve_reference_point(worker_id))
            .await
        {
            Ok(Ok(reference)) => check(at, reference.as_ref()),
            Ok(Err(e)) => {
                warn!(worker_id, error = %e, "reference point lookup failed");
                GeofenceCheck::unavailable()
            }
            Err(_) => {
                warn!(worker_id, deadline_ms = self.deadline.as_millis() as u64, "reference point lookup timed out");
                GeofenceCheck::unavailable()
            }
        }
    }
}
