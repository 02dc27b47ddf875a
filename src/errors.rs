//! Unified application error types.
//!
//! `AppError` is what the plumbing (db, config, cli) returns. `PunchError` is
//! the domain taxonomy produced by the shift engine: it is always returned as
//! a value so batch callers (auto-close, reports) can keep going past a single
//! failing shift.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::models::punch::PunchKind;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid punch type: {0}")]
    InvalidPunchKind(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Domain
    // ---------------------------
    #[error(transparent)]
    Punch(#[from] PunchError),

    #[error("Unknown worker: {0}")]
    UnknownWorker(i64),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Domain rejections raised while applying a punch to a shift.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PunchError {
    #[error("'{punch}' no permitido: {reason}")]
    IllegalTransition { punch: PunchKind, reason: String },

    #[error("ya existe una jornada para el trabajador {worker_id} el {date}")]
    DuplicateShift { worker_id: i64, date: String },

    #[error(
        "el almuerzo duró {elapsed_minutes} minutos, el máximo permitido es {cap_minutes} minutos"
    )]
    BreakDurationExceeded { elapsed_minutes: i64, cap_minutes: i64 },

    #[error(
        "fuera de la ubicación autorizada '{reference}': {distance_m:.1} m (tolerancia {tolerance_m:.0} m)"
    )]
    GeofenceViolation {
        distance_m: f64,
        tolerance_m: f64,
        reference: String,
    },

    #[error("no se pudo validar la ubicación a tiempo")]
    GeofenceUnavailable,

    #[error("se requiere conexión para {action}")]
    ConnectivityRequired { punch: PunchKind, action: String },

    #[error("coordenada inválida: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("fallo transitorio de almacenamiento: {0}")]
    TransientPersistence(String),
}

/// Wire-level kind of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    IllegalTransition,
    DuplicateShift,
    BreakDurationExceeded,
    GeofenceViolation,
    ConnectivityRequired,
    InvalidInput,
    TransientPersistenceFailure,
}

/// Structured rejection handed back to the client transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub error_kind: ErrorKind,
    pub message: String,
    pub context: serde_json::Value,
}

impl PunchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PunchError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            PunchError::DuplicateShift { .. } => ErrorKind::DuplicateShift,
            PunchError::BreakDurationExceeded { .. } => ErrorKind::BreakDurationExceeded,
            PunchError::GeofenceViolation { .. } | PunchError::GeofenceUnavailable => {
                ErrorKind::GeofenceViolation
            }
            PunchError::ConnectivityRequired { .. } => ErrorKind::ConnectivityRequired,
            PunchError::InvalidCoordinate { .. } => ErrorKind::InvalidInput,
            PunchError::TransientPersistence(_) => ErrorKind::TransientPersistenceFailure,
        }
    }

    /// Storage contention and an unanswered location lookup are worth
    /// retrying; everything else needs the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PunchError::TransientPersistence(_) | PunchError::GeofenceUnavailable
        )
    }

    pub fn to_rejection(&self) -> Rejection {
        let context = match self {
            PunchError::IllegalTransition { punch, reason } => {
                json!({ "punch": punch.as_str(), "reason": reason })
            }
            PunchError::DuplicateShift { worker_id, date } => {
                json!({ "worker_id": worker_id, "date": date })
            }
            PunchError::BreakDurationExceeded {
                elapsed_minutes,
                cap_minutes,
            } => json!({ "elapsed_minutes": elapsed_minutes, "cap_minutes": cap_minutes }),
            PunchError::GeofenceViolation {
                distance_m,
                tolerance_m,
                reference,
            } => json!({
                "distance_m": distance_m,
                "tolerance_m": tolerance_m,
                "reference": reference,
            }),
            PunchError::GeofenceUnavailable => json!({ "timed_out": true }),
            PunchError::ConnectivityRequired { punch, .. } => json!({ "punch": punch.as_str() }),
            PunchError::InvalidCoordinate { lat, lon } => json!({ "lat": lat, "lon": lon }),
            PunchError::TransientPersistence(_) => json!({ "retryable": true }),
        };

        Rejection {
            error_kind: self.kind(),
            message: self.to_string(),
            context,
        }
    }
}

impl From<AppError> for PunchError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Punch(p) => p,
            other => PunchError::TransientPersistence(other.to_string()),
        }
    }
}
