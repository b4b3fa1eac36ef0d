use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, instrument};

use super::AttendanceEngine;
use super::lateness::ShiftPolicy;
use crate::error::AppError;
use crate::model::attendance::{
    AttendanceStatus, DayEntry, MonthlySummary, SyntheticAbsence,
};
use crate::store::{AttendanceStore, EmployeeDirectory};

/// `[first day of month, first day of next month)`.
pub fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::invalid(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }

    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1), 1)
    } else {
        (Some(year), month + 1)
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = next_year.and_then(|y| NaiveDate::from_ymd_opt(y, next_month, 1));

    match (first, next) {
        (Some(first), Some(next)) => Ok((first, next)),
        _ => Err(AppError::invalid(format!("year {year} is out of range"))),
    }
}

impl<S: AttendanceStore + EmployeeDirectory> AttendanceEngine<S> {
    /// A day with no record has concluded once it is in the past, or it is
    /// today and the closing hour has been reached.
    fn is_concluded(&self, day: NaiveDate, now: NaiveDateTime) -> bool {
        let today = now.date();
        day < today || (day == today && now.hour() >= self.policy.closing_hour)
    }

    /// One entry per concluded day of the month, most recent first.
    /// Days without a persisted record become synthetic unexcused absences.
    #[instrument(skip(self))]
    pub async fn reconstruct_month(
        &self,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> Result<Vec<DayEntry>, AppError> {
        let (first, next) = month_bounds(month, year)?;
        self.employee(employee_id).await?;

        let mut by_date: HashMap<NaiveDate, _> = self
            .store
            .find_range(employee_id, first, next)
            .await?
            .into_iter()
            .map(|record| (record.date, record))
            .collect();

        let now = self.local_now();
        // planned leave may exist ahead of today; it stays out until its day arrives
        let days: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|d| *d < next && *d <= now.date())
            .collect();
        let mut entries = Vec::with_capacity(days.len());

        for day in days.into_iter().rev() {
            if let Some(record) = by_date.remove(&day) {
                entries.push(DayEntry::Persisted(record));
            } else if self.is_concluded(day, now) {
                entries.push(DayEntry::Synthetic(SyntheticAbsence { date: day }));
            }
        }

        debug!(
            entries = entries.len(),
            synthetic = entries.iter().filter(|e| e.is_synthetic()).count(),
            "Month reconstructed"
        );

        Ok(entries)
    }

    /// Verdict for a single day: the persisted record, a synthetic absence,
    /// or `None` while the day is still open.
    #[instrument(skip(self))]
    pub async fn day_verdict(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<DayEntry>, AppError> {
        self.employee(employee_id).await?;

        Ok(match self.store.find_slot(employee_id, date).await? {
            Some(record) => Some(DayEntry::Persisted(record)),
            None if self.is_concluded(date, self.local_now()) => {
                Some(DayEntry::Synthetic(SyntheticAbsence { date }))
            }
            None => None,
        })
    }
}

/// Payroll totals over a reconstructed month.
pub fn summarize(entries: &[DayEntry], policy: &ShiftPolicy) -> MonthlySummary {
    entries.iter().fold(MonthlySummary::default(), |mut acc, entry| {
        acc.days_with_verdict += 1;
        match entry.status() {
            AttendanceStatus::Present => {
                acc.present_days += 1;
                if let DayEntry::Persisted(record) = entry {
                    let late = policy.recorded_late_minutes(record);
                    if late > 0 {
                        acc.late_days += 1;
                        acc.total_late_minutes += late;
                    }
                }
            }
            AttendanceStatus::AbsentMarked => acc.marked_absences += 1,
            AttendanceStatus::OnLeavePermission | AttendanceStatus::OnLeaveSick => {
                acc.leave_days += 1
            }
            AttendanceStatus::AbsentUnexcused => acc.unexcused_absences += 1,
        }
        acc
    })
}
