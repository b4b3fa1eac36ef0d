use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use std::str::FromStr;

use super::{AttendanceStore, EmployeeDirectory, OnConflict, SlotWrite};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::utils::employee_cache::EmployeeCache;

const SELECT_ATTENDANCE: &str = r#"
    SELECT id, employee_id, date, status, late_minutes, created_at, photo_url, note
    FROM attendance
"#;

// status only; lateness, photo and note survive a re-mark
const UPSERT_KEEP_LATENESS: &str = r#"
    INSERT INTO attendance
        (employee_id, date, status, late_minutes, created_at, photo_url, note)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        status = VALUES(status)
"#;

const UPSERT_RESET_LATENESS: &str = r#"
    INSERT INTO attendance
        (employee_id, date, status, late_minutes, created_at, photo_url, note)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        status = VALUES(status),
        late_minutes = 0,
        note = COALESCE(VALUES(note), note)
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: String,
    late_minutes: Option<u32>,
    created_at: DateTime<Utc>,
    photo_url: Option<String>,
    note: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            tracing::error!(id = row.id, status = %row.status, "Unknown attendance status in store");
            AppError::Internal(format!("unknown attendance status '{}'", row.status))
        })?;

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status,
            late_minutes: row.late_minutes,
            created_at: row.created_at,
            photo_url: row.photo_url,
            note: row.note,
        })
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, AppError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// MySQL-backed ledger. Relies on `uq_attendance_employee_date`.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
    employees: EmployeeCache,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool, employees: EmployeeCache) -> Self {
        Self { pool, employees }
    }

    async fn read_slot(
        tx: &mut Transaction<'_, MySql>,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, AppError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE employee_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_one(&mut **tx)
            .await?;
        row.try_into()
    }
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn find_slot(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE employee_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn find_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let sql = format!(
            "{SELECT_ATTENDANCE} WHERE employee_id = ? AND date >= ? AND date < ? ORDER BY date DESC"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE date = ?");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn upsert_slot(&self, write: SlotWrite) -> Result<AttendanceRecord, AppError> {
        let sql = match write.on_conflict {
            OnConflict::KeepLateness => UPSERT_KEEP_LATENESS,
            OnConflict::ResetLateness { .. } => UPSERT_RESET_LATENESS,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(sql)
            .bind(write.employee_id)
            .bind(write.date)
            .bind(write.status.as_ref())
            .bind(write.late_minutes)
            .bind(write.created_at)
            .bind(write.photo_url.as_deref())
            .bind(write.note())
            .execute(&mut *tx)
            .await?;

        let record = Self::read_slot(&mut tx, write.employee_id, write.date).await?;
        tx.commit().await?;

        tracing::debug!(
            id = record.id,
            employee_id = record.employee_id,
            date = %record.date,
            status = %record.status,
            "Attendance slot upserted"
        );

        Ok(record)
    }
}

impl EmployeeDirectory for MySqlAttendanceStore {
    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, AppError> {
        if let Some(employee) = self.employees.get(employee_id).await {
            return Ok(Some(employee));
        }

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_code, full_name, photo_url
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(found) = &employee {
            self.employees.remember(found.clone()).await;
        }

        Ok(employee)
    }

    async fn count_employees(&self) -> Result<u64, AppError> {
        if let Some(count) = self.employees.head_count().await {
            return Ok(count);
        }

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        let count = u64::try_from(count).unwrap_or(0);

        self.employees.remember_head_count(count).await;
        Ok(count)
    }
}
