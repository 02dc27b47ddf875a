use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::clock::LocalTime;
use crate::models::coordinate::Coordinate;

/// Every punch a worker can record during a shift.
///
/// The string form is the column name of the field it writes on `shifts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    Entrada,
    DescansoMananaInicio,
    DescansoMananaFin,
    AlmuerzoInicio,
    AlmuerzoFin,
    DescansoTardeInicio,
    DescansoTardeFin,
    Salida,
}

/// The three breaks a shift can contain, in their legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    DescansoManana,
    Almuerzo,
    DescansoTarde,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakEdge {
    Start,
    End,
}

/// Entrada/salida need live server validation; everything else may be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criticality {
    Critical,
    Deferrable,
}

impl PunchKind {
    pub const ALL: [PunchKind; 8] = [
        PunchKind::Entrada,
        PunchKind::DescansoMananaInicio,
        PunchKind::DescansoMananaFin,
        PunchKind::AlmuerzoInicio,
        PunchKind::AlmuerzoFin,
        PunchKind::DescansoTardeInicio,
        PunchKind::DescansoTardeFin,
        PunchKind::Salida,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PunchKind::Entrada => "entrada",
            PunchKind::DescansoMananaInicio => "descanso_manana_inicio",
            PunchKind::DescansoMananaFin => "descanso_manana_fin",
            PunchKind::AlmuerzoInicio => "almuerzo_inicio",
            PunchKind::AlmuerzoFin => "almuerzo_fin",
            PunchKind::DescansoTardeInicio => "descanso_tarde_inicio",
            PunchKind::DescansoTardeFin => "descanso_tarde_fin",
            PunchKind::Salida => "salida",
        }
    }

    /// Accepts the column name, case-insensitive, with `-` or `_`.
    pub fn parse(s: &str) -> Option<Self> {
        let norm = s.trim().to_lowercase().replace('-', "_");
        PunchKind::ALL.into_iter().find(|k| k.as_str() == norm)
    }

    pub fn criticality(&self) -> Criticality {
        match self {
            PunchKind::Entrada | PunchKind::Salida => Criticality::Critical,
            _ => Criticality::Deferrable,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.criticality() == Criticality::Critical
    }

    /// Which break this punch opens or closes, if any.
    pub fn break_edge(&self) -> Option<(BreakKind, BreakEdge)> {
        match self {
            PunchKind::DescansoMananaInicio => Some((BreakKind::DescansoManana, BreakEdge::Start)),
            PunchKind::DescansoMananaFin => Some((BreakKind::DescansoManana, BreakEdge::End)),
            PunchKind::AlmuerzoInicio => Some((BreakKind::Almuerzo, BreakEdge::Start)),
            PunchKind::AlmuerzoFin => Some((BreakKind::Almuerzo, BreakEdge::End)),
            PunchKind::DescansoTardeInicio => Some((BreakKind::DescansoTarde, BreakEdge::Start)),
            PunchKind::DescansoTardeFin => Some((BreakKind::DescansoTarde, BreakEdge::End)),
            PunchKind::Entrada | PunchKind::Salida => None,
        }
    }
}

impl fmt::Display for PunchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BreakKind {
    pub const ALL: [BreakKind; 3] = [
        BreakKind::DescansoManana,
        BreakKind::Almuerzo,
        BreakKind::DescansoTarde,
    ];

    pub fn start(&self) -> PunchKind {
        match self {
            BreakKind::DescansoManana => PunchKind::DescansoMananaInicio,
            BreakKind::Almuerzo => PunchKind::AlmuerzoInicio,
            BreakKind::DescansoTarde => PunchKind::DescansoTardeInicio,
        }
    }

    pub fn end(&self) -> PunchKind {
        match self {
            BreakKind::DescansoManana => PunchKind::DescansoMananaFin,
            BreakKind::Almuerzo => PunchKind::AlmuerzoFin,
            BreakKind::DescansoTarde => PunchKind::DescansoTardeFin,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BreakKind::DescansoManana => "descanso de la mañana",
            BreakKind::Almuerzo => "almuerzo",
            BreakKind::DescansoTarde => "descanso de la tarde",
        }
    }
}

/// A punch as submitted by the client. Never stored on its own: it only
/// exists while being applied to a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunchEvent {
    pub kind: PunchKind,
    /// `None` means "now" on the server clock. Replayed offline punches carry
    /// the instant they were taken on the device.
    #[serde(default, with = "crate::core::clock::opt_local")]
    pub timestamp: Option<LocalTime>,
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub observations: Option<String>,
    /// The user saw the geofence shortfall and chose to continue. Only
    /// honoured for deferrable punches.
    #[serde(default)]
    pub geofence_override: bool,
    /// Taken earlier on the device and replayed from its queue. Only such
    /// punches are measured on their own timestamp; live punches are
    /// measured against the server clock.
    #[serde(default)]
    pub replayed: bool,
}

impl PunchEvent {
    pub fn new(kind: PunchKind, coordinate: Coordinate) -> Self {
        Self {
            kind,
            timestamp: None,
            coordinate,
            accuracy_m: None,
            observations: None,
            geofence_override: false,
            replayed: false,
        }
    }

    pub fn at(mut self, ts: LocalTime) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn with_observations(mut self, obs: impl Into<String>) -> Self {
        self.observations = Some(obs.into());
        self
    }

    pub fn with_override(mut self) -> Self {
        self.geofence_override = true;
        self
    }

    /// Marks a punch taken earlier on the device at `ts`.
    pub fn replayed_at(mut self, ts: LocalTime) -> Self {
        self.timestamp = Some(ts);
        self.replayed = true;
        self
    }
}
