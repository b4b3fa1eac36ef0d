use chrono::NaiveDate;
use tracing::instrument;

use super::AttendanceEngine;
use crate::error::AppError;
use crate::model::attendance::{AttendanceStatus, DailyStats};
use crate::store::{AttendanceStore, EmployeeDirectory};

impl<S: AttendanceStore + EmployeeDirectory> AttendanceEngine<S> {
    /// Counts for `date` from persisted rows only; synthetic absences are ignored.
    #[instrument(skip(self))]
    pub async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, AppError> {
        let total_employees = self.store.count_employees().await?;
        let records = self.store.find_by_date(date).await?;

        let mut stats = DailyStats {
            total_employees,
            ..DailyStats::default()
        };

        for record in &records {
            match record.status {
                AttendanceStatus::Present => {
                    stats.present_count += 1;
                    if self.policy.recorded_late_minutes(record) > 0 {
                        stats.late_count += 1;
                    }
                }
                status if status.is_leave() => stats.on_leave_count += 1,
                _ => {}
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::attendance::AttendanceRecord;
    use crate::service::lateness::ShiftPolicy;
    use crate::store::memory::MemoryStore;
    use crate::utils::clock::FixedClock;

    fn record(
        id: u64,
        employee_id: u64,
        status: AttendanceStatus,
        late_minutes: Option<u32>,
        hour: u32,
        minute: u32,
    ) -> AttendanceRecord {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        AttendanceRecord {
            id,
            employee_id,
            date,
            status,
            late_minutes,
            created_at: Utc.from_utc_datetime(&date.and_hms_opt(hour, minute, 0).unwrap()),
            photo_url: None,
            note: None,
        }
    }

    fn engine() -> AttendanceEngine<MemoryStore> {
        AttendanceEngine::new(
            MemoryStore::with_employees(1..=6),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap())),
            ShiftPolicy::default(),
        )
    }

    #[actix_web::test]
    async fn counts_presence_lateness_and_leave() {
        let engine = engine();
        let store = engine.store();
        store.seed(record(1, 1, AttendanceStatus::Present, Some(0), 8, 50));
        store.seed(record(2, 2, AttendanceStatus::Present, Some(30), 9, 10));
        store.seed(record(3, 3, AttendanceStatus::OnLeaveSick, Some(0), 7, 0));
        store.seed(record(4, 4, AttendanceStatus::OnLeavePermission, Some(0), 7, 0));
        store.seed(record(5, 5, AttendanceStatus::AbsentMarked, Some(0), 9, 0));

        let stats = engine
            .daily_stats(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
            .await
            .unwrap();

        assert_eq!(
            stats,
            DailyStats {
                total_employees: 6,
                present_count: 2,
                late_count: 1,
                on_leave_count: 2,
            }
        );
    }

    #[actix_web::test]
    async fn missing_lateness_is_recomputed_from_check_in_time() {
        let engine = engine();
        let store = engine.store();
        store.seed(record(1, 1, AttendanceStatus::Present, None, 9, 20));
        store.seed(record(2, 2, AttendanceStatus::Present, None, 8, 59));

        let stats = engine
            .daily_stats(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
            .await
            .unwrap();

        assert_eq!(stats.present_count, 2);
        assert_eq!(stats.late_count, 1);
    }

    #[actix_web::test]
    async fn days_without_records_only_report_head_count() {
        let engine = engine();
        let stats = engine
            .daily_stats(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(
            stats,
            DailyStats {
                total_employees: 6,
                ..DailyStats::default()
            }
        );
    }
}
