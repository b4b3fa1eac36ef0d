use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::service::lateness::ShiftPolicy;

/// Verdict recorded for one employee on one calendar day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    /// A check-in happened that day.
    Present,
    /// Recorded as absent by a check-in device or supervisor.
    AbsentMarked,
    OnLeavePermission,
    OnLeaveSick,
    /// No check-in and no excuse by the closing cutoff.
    AbsentUnexcused,
}

impl AttendanceStatus {
    /// Statuses a check-in or attendance toggle may record.
    pub fn is_check_in_status(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::AbsentMarked)
    }

    /// Excused outcomes entered through a correction.
    pub fn is_leave(self) -> bool {
        matches!(
            self,
            AttendanceStatus::OnLeavePermission | AttendanceStatus::OnLeaveSick
        )
    }
}

/// Persisted attendance row. At most one exists per (employee_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 41,
    "employee_id": 1000,
    "date": "2026-10-14",
    "status": "present",
    "late_minutes": 60,
    "created_at": "2026-10-14T09:45:00Z",
    "photo_url": null,
    "note": null
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Rounded tardiness. `None` on legacy rows written before lateness was stored.
    pub late_minutes: Option<u32>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub photo_url: Option<String>,
    pub note: Option<String>,
}

/// Read-time placeholder for a concluded day with no persisted record.
/// Never stored; correcting it creates a real [`AttendanceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticAbsence {
    pub date: NaiveDate,
}

impl SyntheticAbsence {
    /// Stable identifier derived from the date alone.
    pub fn id(&self) -> String {
        format!("absent-{}", self.date.format("%Y-%m-%d"))
    }

    pub fn status(&self) -> AttendanceStatus {
        AttendanceStatus::AbsentUnexcused
    }
}

/// One day of a monthly reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DayEntry {
    Persisted(AttendanceRecord),
    Synthetic(SyntheticAbsence),
}

impl DayEntry {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayEntry::Persisted(record) => record.date,
            DayEntry::Synthetic(absence) => absence.date,
        }
    }

    pub fn status(&self) -> AttendanceStatus {
        match self {
            DayEntry::Persisted(record) => record.status,
            DayEntry::Synthetic(absence) => absence.status(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DayEntry::Synthetic(_))
    }
}

/// Wire shape of a [`DayEntry`]; `synthetic` tells clients whether the row is durable.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayEntryView {
    pub id: String,
    pub synthetic: bool,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    pub photo_url: Option<String>,
    pub note: Option<String>,
}

impl DayEntryView {
    /// Legacy rows without stored lateness get it recomputed under `policy`.
    pub fn new(employee_id: u64, entry: DayEntry, policy: &ShiftPolicy) -> Self {
        match entry {
            DayEntry::Persisted(record) => Self {
                id: record.id.to_string(),
                synthetic: false,
                employee_id: record.employee_id,
                date: record.date,
                status: record.status,
                late_minutes: match record.status {
                    AttendanceStatus::Present => policy.recorded_late_minutes(&record),
                    _ => record.late_minutes.unwrap_or(0),
                },
                created_at: Some(record.created_at),
                photo_url: record.photo_url,
                note: record.note,
            },
            DayEntry::Synthetic(absence) => Self {
                id: absence.id(),
                synthetic: true,
                employee_id,
                date: absence.date,
                status: absence.status(),
                late_minutes: 0,
                created_at: None,
                photo_url: None,
                note: None,
            },
        }
    }
}

/// Fleet-wide counts for one date, built only from persisted rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyStats {
    pub total_employees: u64,
    pub present_count: u64,
    pub late_count: u64,
    pub on_leave_count: u64,
}

/// Per-employee month totals used by payroll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub days_with_verdict: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub total_late_minutes: u32,
    pub leave_days: u32,
    pub marked_absences: u32,
    pub unexcused_absences: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_db_text() {
        assert_eq!(AttendanceStatus::OnLeaveSick.as_ref(), "on_leave_sick");
        assert_eq!(
            AttendanceStatus::from_str("absent_marked").unwrap(),
            AttendanceStatus::AbsentMarked
        );
        assert!(AttendanceStatus::from_str("late").is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let v = serde_json::to_value(AttendanceStatus::OnLeavePermission).unwrap();
        assert_eq!(v, serde_json::json!("on_leave_permission"));
    }

    #[test]
    fn synthetic_id_is_derived_from_date() {
        let absence = SyntheticAbsence {
            date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
        };
        assert_eq!(absence.id(), "absent-2026-03-05");
        assert_eq!(absence.status(), AttendanceStatus::AbsentUnexcused);
    }

    #[test]
    fn synthetic_view_has_no_lateness_or_photo() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let view = DayEntryView::new(
            9,
            DayEntry::Synthetic(SyntheticAbsence { date }),
            &ShiftPolicy::default(),
        );
        assert!(view.synthetic);
        assert_eq!(view.employee_id, 9);
        assert_eq!(view.late_minutes, 0);
        assert!(view.photo_url.is_none());
        assert!(view.created_at.is_none());
    }

    #[test]
    fn legacy_present_view_recomputes_lateness() {
        use chrono::TimeZone;

        let date = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        let legacy = AttendanceRecord {
            id: 7,
            employee_id: 9,
            date,
            status: AttendanceStatus::Present,
            late_minutes: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 5, 9, 45, 0).unwrap(),
            photo_url: None,
            note: None,
        };

        let view = DayEntryView::new(9, DayEntry::Persisted(legacy.clone()), &ShiftPolicy::default());
        assert_eq!(view.late_minutes, 60);

        let excused = AttendanceRecord {
            status: AttendanceStatus::OnLeaveSick,
            ..legacy
        };
        let view = DayEntryView::new(9, DayEntry::Persisted(excused), &ShiftPolicy::default());
        assert_eq!(view.late_minutes, 0);
    }
}
