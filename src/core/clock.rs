//! Colombian civil time.
//!
//! Every instant the engine touches is a `LocalTime` in `America/Bogota`
//! (UTC-5, no DST). Conversion happens once at the boundary: parsing client
//! input, reading rows from the store. Nothing downstream re-derives the zone.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use chrono_tz::America::Bogota;
use chrono_tz::Tz;

use crate::errors::{AppError, AppResult};

pub type LocalTime = DateTime<Tz>;

pub const ZONE: Tz = Bogota;

pub fn from_utc(ts: DateTime<Utc>) -> LocalTime {
    ts.with_timezone(&ZONE)
}

/// Wall-clock time in Colombia. Bogota has no DST gaps, `single()` never fails
/// for valid naive inputs.
pub fn from_naive(naive: NaiveDateTime) -> AppResult<LocalTime> {
    ZONE.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AppError::InvalidTime(naive.to_string()))
}

pub fn civil_date(ts: &LocalTime) -> NaiveDate {
    ts.date_naive()
}

/// Parses RFC3339 or `YYYY-MM-DD HH:MM[:SS]` (taken as Colombian wall time).
pub fn parse_local(s: &str) -> AppResult<LocalTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&ZONE));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return from_naive(naive);
        }
    }
    Err(AppError::InvalidTime(s.to_string()))
}

/// Storage format: RFC3339 with the -05:00 offset, whole seconds.
pub fn to_storage(ts: &LocalTime) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn from_storage(s: &str) -> AppResult<LocalTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&ZONE))
        .map_err(|_| AppError::InvalidTime(s.to_string()))
}

/// Punches are recorded with whole-second precision.
pub fn truncate_seconds(ts: LocalTime) -> LocalTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> LocalTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTime {
        from_utc(Utc::now())
    }
}

/// Settable clock for tests and replays.
pub struct FixedClock {
    now: Mutex<LocalTime>,
}

impl FixedClock {
    pub fn new(now: LocalTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: LocalTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> LocalTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// serde helper for `Option<LocalTime>` fields (chrono only deserializes
/// fixed-offset, UTC and Local zones natively).
pub mod opt_local {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{LocalTime, ZONE};

    pub fn serialize<S: Serializer>(v: &Option<LocalTime>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(ts) => s.serialize_some(&ts.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LocalTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&ZONE))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// serde helper for required `LocalTime` fields.
pub mod local {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{LocalTime, ZONE};

    pub fn serialize<S: Serializer>(v: &LocalTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LocalTime, D::Error> {
        let raw = String::deserialize(d)?;
        chrono::DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&ZONE))
            .map_err(serde::de::Error::custom)
    }
}
