use chrono::NaiveDate;
use tracing::{info, instrument};

use super::AttendanceEngine;
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::store::{AttendanceStore, EmployeeDirectory, OnConflict, SlotWrite};

impl<S: AttendanceStore + EmployeeDirectory> AttendanceEngine<S> {
    /// Records a check-in verdict for (employee, date).
    ///
    /// A new slot gets lateness computed against "now" when the status is
    /// `Present`. An existing slot only has its status replaced.
    #[instrument(skip(self, photo_url))]
    pub async fn mark_attendance(
        &self,
        employee_id: u64,
        status: AttendanceStatus,
        date: NaiveDate,
        photo_url: Option<String>,
    ) -> Result<AttendanceRecord, AppError> {
        if !status.is_check_in_status() {
            return Err(AppError::invalid(format!(
                "status '{status}' cannot be marked; use present or absent_marked"
            )));
        }

        let now = self.clock.now();
        let local_now = self.policy.local(now);
        if date > local_now.date() {
            return Err(AppError::invalid(format!(
                "cannot mark attendance for future date {date}"
            )));
        }

        self.employee(employee_id).await?;

        let late_minutes = match status {
            AttendanceStatus::Present => self.compute_lateness(local_now).late_minutes,
            _ => 0,
        };

        let record = self
            .store
            .upsert_slot(SlotWrite {
                employee_id,
                date,
                status,
                late_minutes,
                created_at: now,
                photo_url,
                on_conflict: OnConflict::KeepLateness,
            })
            .await?;

        info!(id = record.id, late_minutes = ?record.late_minutes, "Attendance marked");
        Ok(record)
    }

    /// Converts a day (synthetic or persisted) into an excused leave record.
    /// Lateness is always zeroed.
    #[instrument(skip(self, note))]
    pub async fn correct_status(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
        note: Option<String>,
    ) -> Result<AttendanceRecord, AppError> {
        if !status.is_leave() {
            return Err(AppError::invalid(format!(
                "status '{status}' is not a correction; use on_leave_permission or on_leave_sick"
            )));
        }

        self.employee(employee_id).await?;

        let note = note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        let record = self
            .store
            .upsert_slot(SlotWrite {
                employee_id,
                date,
                status,
                late_minutes: 0,
                created_at: self.clock.now(),
                photo_url: None,
                on_conflict: OnConflict::ResetLateness { note },
            })
            .await?;

        info!(id = record.id, "Attendance corrected");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::service::lateness::ShiftPolicy;
    use crate::store::memory::MemoryStore;
    use crate::utils::clock::FixedClock;

    fn engine_at(now: DateTime<Utc>) -> AttendanceEngine<MemoryStore> {
        AttendanceEngine::new(
            MemoryStore::with_employees([1, 2]),
            Arc::new(FixedClock(now)),
            ShiftPolicy::default(),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[actix_web::test]
    async fn late_check_in_is_rounded_up() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 9, 45, 0).unwrap());
        let record = engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), None)
            .await
            .unwrap();

        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.late_minutes, Some(60));
    }

    #[actix_web::test]
    async fn early_check_in_is_on_time() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 8, 58, 0).unwrap());
        let record = engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), Some("s3://p/1.jpg".into()))
            .await
            .unwrap();

        assert_eq!(record.late_minutes, Some(0));
        assert_eq!(record.photo_url.as_deref(), Some("s3://p/1.jpg"));
    }

    #[actix_web::test]
    async fn second_mark_updates_status_and_keeps_lateness() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 9, 45, 0).unwrap());
        let first = engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), None)
            .await
            .unwrap();
        let second = engine
            .mark_attendance(1, AttendanceStatus::AbsentMarked, day(14), None)
            .await
            .unwrap();

        assert_eq!(engine.store().len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.status, AttendanceStatus::AbsentMarked);
        assert_eq!(second.late_minutes, Some(60));
        assert_eq!(second.created_at, first.created_at);
    }

    #[actix_web::test]
    async fn concurrent_marks_share_one_slot() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 9, 45, 0).unwrap());

        let (a, b) = futures::join!(
            engine.mark_attendance(1, AttendanceStatus::Present, day(14), None),
            engine.mark_attendance(1, AttendanceStatus::AbsentMarked, day(14), None),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(engine.store().len(), 1);
        assert_eq!(a.id, b.id);
        let stored = engine.store().find_slot(1, day(14)).await.unwrap().unwrap();
        assert!(stored.status == a.status || stored.status == b.status);
    }

    #[actix_web::test]
    async fn repeat_check_in_keeps_the_first_photo() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 8, 50, 0).unwrap());
        engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), Some("s3://p/a.jpg".into()))
            .await
            .unwrap();
        let again = engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), Some("s3://p/b.jpg".into()))
            .await
            .unwrap();

        assert_eq!(again.photo_url.as_deref(), Some("s3://p/a.jpg"));
    }

    #[actix_web::test]
    async fn absent_marked_has_no_lateness() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 16, 10, 0).unwrap());
        let record = engine
            .mark_attendance(2, AttendanceStatus::AbsentMarked, day(14), None)
            .await
            .unwrap();
        assert_eq!(record.late_minutes, Some(0));
    }

    #[actix_web::test]
    async fn correction_zeroes_lateness_and_keeps_the_slot() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 10, 5, 0).unwrap());
        let checked_in = engine
            .mark_attendance(1, AttendanceStatus::Present, day(14), None)
            .await
            .unwrap();
        assert_eq!(checked_in.late_minutes, Some(90));

        let corrected = engine
            .correct_status(1, day(14), AttendanceStatus::OnLeavePermission, Some(" dentist ".into()))
            .await
            .unwrap();

        assert_eq!(engine.store().len(), 1);
        assert_eq!(corrected.id, checked_in.id);
        assert_eq!(corrected.status, AttendanceStatus::OnLeavePermission);
        assert_eq!(corrected.late_minutes, Some(0));
        assert_eq!(corrected.note.as_deref(), Some("dentist"));
    }

    #[actix_web::test]
    async fn correction_of_an_empty_day_creates_a_record() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap());
        let record = engine
            .correct_status(2, day(6), AttendanceStatus::OnLeaveSick, Some("flu".into()))
            .await
            .unwrap();

        assert_eq!(record.date, day(6));
        assert_eq!(record.late_minutes, Some(0));
        assert_eq!(record.note.as_deref(), Some("flu"));
        assert!(engine.store().find_slot(2, day(6)).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn rejects_statuses_outside_each_operation() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap());

        let marked = engine
            .mark_attendance(1, AttendanceStatus::OnLeaveSick, day(14), None)
            .await;
        assert!(matches!(marked, Err(AppError::InvalidInput(_))));

        let corrected = engine
            .correct_status(1, day(14), AttendanceStatus::Present, None)
            .await;
        assert!(matches!(corrected, Err(AppError::InvalidInput(_))));
        assert_eq!(engine.store().len(), 0);
    }

    #[actix_web::test]
    async fn rejects_future_marks_but_accepts_planned_leave() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap());

        let marked = engine
            .mark_attendance(1, AttendanceStatus::Present, day(15), None)
            .await;
        assert!(matches!(marked, Err(AppError::InvalidInput(_))));

        let leave = engine
            .correct_status(1, day(20), AttendanceStatus::OnLeavePermission, None)
            .await
            .unwrap();
        assert_eq!(leave.note, None);
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap());
        let result = engine
            .mark_attendance(99, AttendanceStatus::Present, day(14), None)
            .await;
        assert_eq!(result, Err(AppError::NotFound(99)));
    }

    #[actix_web::test]
    async fn store_outage_is_reported_as_retryable() {
        let engine = engine_at(Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap());
        engine.store().set_offline(true);

        let err = engine
            .correct_status(1, day(14), AttendanceStatus::OnLeaveSick, None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
