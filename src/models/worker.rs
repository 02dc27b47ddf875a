use serde::Serialize;

use crate::models::coordinate::Coordinate;

/// Contact data used when a worker must be told about a forced close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerContact {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A site assigned to one specific worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkSite {
    pub worker_id: i64,
    pub name: String,
    pub point: Coordinate,
    pub tolerance_m: f64,
}

/// The office of a regional. Regionals have no tolerance of their own, the
/// configured default applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSite {
    pub id: i64,
    pub name: String,
    pub point: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub regional_id: Option<i64>,
    /// "visita" workers travel between client sites.
    pub is_visitor: bool,
}
