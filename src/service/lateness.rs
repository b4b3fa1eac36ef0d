//! Shift-target tardiness rule.
//!
//! The day splits at local noon into a morning shift (target 09:00) and an
//! afternoon shift (target 15:00). Arrivals after the target are reported in
//! whole 30 minute buckets, rounded up.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Offset, Timelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

/// Tardiness is reported in multiples of this many minutes.
pub const LATENESS_BUCKET_MINUTES: u32 = 30;

const SHIFT_SPLIT_HOUR: u32 = 12;
const MORNING_TARGET_HOUR: u32 = 9;
const AFTERNOON_TARGET_HOUR: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
}

impl Shift {
    pub fn for_hour(hour: u32) -> Self {
        if hour < SHIFT_SPLIT_HOUR {
            Shift::Morning
        } else {
            Shift::Afternoon
        }
    }

    pub fn window_start(self) -> NaiveTime {
        match self {
            Shift::Morning => NaiveTime::MIN,
            Shift::Afternoon => hms(SHIFT_SPLIT_HOUR),
        }
    }

    pub fn target(self) -> NaiveTime {
        match self {
            Shift::Morning => hms(MORNING_TARGET_HOUR),
            Shift::Afternoon => hms(AFTERNOON_TARGET_HOUR),
        }
    }
}

fn hms(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Lateness {
    pub late_minutes: u32,
    pub shift: Shift,
    #[schema(value_type = String, format = "date-time")]
    pub target: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub window_start: NaiveDateTime,
}

/// Computes lateness for a local wall-clock instant.
pub fn compute_lateness(local: NaiveDateTime) -> Lateness {
    let shift = Shift::for_hour(local.hour());
    let day = local.date();
    let target = day.and_time(shift.target());

    let late_minutes = if local <= target {
        0
    } else {
        // whole elapsed minutes, seconds truncated
        let diff = u32::try_from((local - target).num_minutes()).unwrap_or(u32::MAX);
        if diff > 0 {
            diff.div_ceil(LATENESS_BUCKET_MINUTES)
                .saturating_mul(LATENESS_BUCKET_MINUTES)
        } else {
            0
        }
    };

    Lateness {
        late_minutes,
        shift,
        target,
        window_start: day.and_time(shift.window_start()),
    }
}

/// Local-time rules shared by the write path and the reconstructor.
#[derive(Debug, Clone, Copy)]
pub struct ShiftPolicy {
    pub offset: FixedOffset,
    /// Local hour after which an unrecorded "today" counts as concluded.
    pub closing_hour: u32,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            closing_hour: 22,
        }
    }
}

impl ShiftPolicy {
    pub fn new(offset: FixedOffset, closing_hour: u32) -> Self {
        Self {
            offset,
            closing_hour,
        }
    }

    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn lateness_at(&self, instant: DateTime<Utc>) -> Lateness {
        compute_lateness(self.local(instant))
    }

    /// Stored lateness, or the rule re-applied to `created_at` for legacy rows.
    pub fn recorded_late_minutes(&self, record: &AttendanceRecord) -> u32 {
        record
            .late_minutes
            .unwrap_or_else(|| self.lateness_at(record.created_at).late_minutes)
    }
}
