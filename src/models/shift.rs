use chrono::NaiveDate;
use serde::Serialize;

use crate::core::clock::LocalTime;
use crate::models::punch::{BreakKind, PunchKind};

/// One worker's workday ("jornada"). Unique per (worker, date) and never
/// deleted: it is the audit trail of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shift {
    pub id: i64,
    pub worker_id: i64,
    pub date: NaiveDate, // ⇔ civil date in Colombia of `entrada`
    pub entrada: Option<LocalTime>,
    pub descanso_manana_inicio: Option<LocalTime>,
    pub descanso_manana_fin: Option<LocalTime>,
    pub almuerzo_inicio: Option<LocalTime>,
    pub almuerzo_fin: Option<LocalTime>,
    pub descanso_tarde_inicio: Option<LocalTime>,
    pub descanso_tarde_fin: Option<LocalTime>,
    pub salida: Option<LocalTime>,
    pub worked_hours: f64,
    pub auto_closed: bool,
    pub observations: String,
}

/// Where a shift currently stands in the punch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShiftState {
    NotStarted,
    Open,
    OnBreak(BreakKind),
    Closed,
}

impl Shift {
    /// A shift that only has its `entrada`; `id` is assigned by the store.
    pub fn opened(worker_id: i64, date: NaiveDate, entrada: LocalTime) -> Self {
        Self {
            id: 0,
            worker_id,
            date,
            entrada: Some(entrada),
            descanso_manana_inicio: None,
            descanso_manana_fin: None,
            almuerzo_inicio: None,
            almuerzo_fin: None,
            descanso_tarde_inicio: None,
            descanso_tarde_fin: None,
            salida: None,
            worked_hours: 0.0,
            auto_closed: false,
            observations: String::new(),
        }
    }

    pub fn get(&self, kind: PunchKind) -> Option<LocalTime> {
        match kind {
            PunchKind::Entrada => self.entrada,
            PunchKind::DescansoMananaInicio => self.descanso_manana_inicio,
            PunchKind::DescansoMananaFin => self.descanso_manana_fin,
            PunchKind::AlmuerzoInicio => self.almuerzo_inicio,
            PunchKind::AlmuerzoFin => self.almuerzo_fin,
            PunchKind::DescansoTardeInicio => self.descanso_tarde_inicio,
            PunchKind::DescansoTardeFin => self.descanso_tarde_fin,
            PunchKind::Salida => self.salida,
        }
    }

    pub fn set(&mut self, kind: PunchKind, at: LocalTime) {
        let slot = match kind {
            PunchKind::Entrada => &mut self.entrada,
            PunchKind::DescansoMananaInicio => &mut self.descanso_manana_inicio,
            PunchKind::DescansoMananaFin => &mut self.descanso_manana_fin,
            PunchKind::AlmuerzoInicio => &mut self.almuerzo_inicio,
            PunchKind::AlmuerzoFin => &mut self.almuerzo_fin,
            PunchKind::DescansoTardeInicio => &mut self.descanso_tarde_inicio,
            PunchKind::DescansoTardeFin => &mut self.descanso_tarde_fin,
            PunchKind::Salida => &mut self.salida,
        };
        *slot = Some(at);
    }

    pub fn break_span(&self, b: BreakKind) -> (Option<LocalTime>, Option<LocalTime>) {
        (self.get(b.start()), self.get(b.end()))
    }

    /// The break started and not yet finished, if any.
    pub fn open_break(&self) -> Option<BreakKind> {
        BreakKind::ALL
            .into_iter()
            .find(|b| matches!(self.break_span(*b), (Some(_), None)))
    }

    pub fn is_closed(&self) -> bool {
        self.salida.is_some()
    }

    pub fn state(&self) -> ShiftState {
        if self.entrada.is_none() {
            ShiftState::NotStarted
        } else if self.is_closed() {
            ShiftState::Closed
        } else if let Some(b) = self.open_break() {
            ShiftState::OnBreak(b)
        } else {
            ShiftState::Open
        }
    }

    /// Most recent instant recorded on the shift.
    pub fn latest_punch(&self) -> Option<LocalTime> {
        PunchKind::ALL.into_iter().filter_map(|k| self.get(k)).max()
    }

    pub fn append_observation(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        if !self.observations.is_empty() {
            self.observations.push_str(" | ");
        }
        self.observations.push_str(note);
    }
}

/// Snapshot returned by status queries.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftStatus {
    pub shift: Shift,
    pub state: ShiftState,
    pub hours: crate::core::calculator::accounting::HoursBreakdown,
}
