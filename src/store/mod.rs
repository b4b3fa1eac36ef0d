//! Persistence seam for the attendance ledger.
//!
//! Implementations must enforce uniqueness of (employee_id, date) and apply
//! [`SlotWrite`] as one atomic insert-or-update.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// What an upsert does to an existing row for the same slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnConflict {
    /// Overwrite the status only; lateness, photo and note stay as they are.
    KeepLateness,
    /// Overwrite the status and note, and zero the lateness.
    ResetLateness { note: Option<String> },
}

/// Insert values for an (employee_id, date) slot plus the conflict policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWrite {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Used only when the slot is empty.
    pub late_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub photo_url: Option<String>,
    pub on_conflict: OnConflict,
}

impl SlotWrite {
    /// Note stored on insert.
    pub fn note(&self) -> Option<&str> {
        match &self.on_conflict {
            OnConflict::ResetLateness { note } => note.as_deref(),
            OnConflict::KeepLateness => None,
        }
    }
}

pub trait AttendanceStore {
    async fn find_slot(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Records for one employee with `from <= date < until`.
    async fn find_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Atomically inserts or updates the slot and returns the resulting row.
    async fn upsert_slot(&self, write: SlotWrite) -> Result<AttendanceRecord, AppError>;
}

pub trait EmployeeDirectory {
    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, AppError>;

    async fn count_employees(&self) -> Result<u64, AppError>;
}
