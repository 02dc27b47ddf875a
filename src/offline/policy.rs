//! Decides whether a punch goes to the server now, waits in the local queue,
//! or is refused on the device.

use serde::{Deserialize, Serialize};

use crate::errors::PunchError;
use crate::models::punch::{Criticality, PunchKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub pwa_installed: bool,
    pub online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Send,
    Queue,
}

fn required_for(kind: PunchKind) -> &'static str {
    match kind {
        PunchKind::Entrada => "iniciar la jornada",
        PunchKind::Salida => "finalizar la jornada",
        _ => "registrar la marcación",
    }
}

/// | pwa   | online | critical | deferrable |
/// |-------|--------|----------|------------|
/// | any   | true   | send     | send       |
/// | false | false  | reject   | reject     |
/// | true  | false  | reject   | queue      |
pub fn dispatch(kind: PunchKind, conn: Connectivity) -> Result<Dispatch, PunchError> {
    if conn.online {
        return Ok(Dispatch::Send);
    }
    match (conn.pwa_installed, kind.criticality()) {
        (true, Criticality::Deferrable) => Ok(Dispatch::Queue),
        _ => Err(PunchError::ConnectivityRequired {
            punch: kind,
            action: required_for(kind).to_string(),
        }),
    }
}
