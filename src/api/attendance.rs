use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{AttendanceRecord, AttendanceStatus, DailyStats, DayEntryView, MonthlySummary},
        employee::Employee,
    },
    service::{AttendanceEngine, lateness::Lateness, monthly::summarize},
    store::{AttendanceStore, EmployeeDirectory},
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct LatenessQuery {
    /// RFC 3339 instant; defaults to now
    #[param(example = "2026-10-14T09:45:00+06:00")]
    pub at: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct CheckInRequest {
    /// Opaque URL returned by the photo storage service
    #[schema(example = "https://cdn.example.com/checkins/1000/2026-10-14.jpg")]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkRequest {
    #[schema(example = "present")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct CorrectionRequest {
    #[schema(example = "on_leave_sick")]
    pub status: AttendanceStatus,
    #[schema(example = "flu")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    #[param(example = 10)]
    pub month: u32,
    #[param(example = 2026)]
    pub year: i32,
}

#[derive(Deserialize, IntoParams)]
pub struct StatsQuery {
    /// YYYY-MM-DD; defaults to today
    #[param(example = "2026-10-14")]
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyAttendanceResponse {
    pub employee: Employee,
    pub month: u32,
    pub year: i32,
    pub summary: MonthlySummary,
    pub days: Vec<DayEntryView>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid(format!("'{raw}' is not a valid YYYY-MM-DD date")))
}

/// Lateness preview for an instant
#[utoipa::path(
    get,
    path = "/api/attendance/lateness",
    params(LatenessQuery),
    responses(
        (status = 200, description = "Lateness under the shift rule", body = Lateness),
        (status = 400, description = "Malformed instant"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn lateness<S: 'static>(
    _auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    query: web::Query<LatenessQuery>,
) -> Result<HttpResponse, AppError> {
    let local = match query.at.as_deref() {
        Some(raw) => {
            let instant = DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|_| AppError::invalid(format!("'{raw}' is not an RFC 3339 instant")))?;
            engine.policy().local(instant.with_timezone(&Utc))
        }
        None => engine.local_now(),
    };

    Ok(HttpResponse::Ok().json(engine.compute_lateness(local)))
}

/// Self-service check-in for today
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found"),
        (status = 503, description = "Store unavailable, retry")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    payload: Option<web::Json<CheckInRequest>>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    let employee_id = auth.own_employee_id()?;
    let photo_url = payload
        .map(|p| p.into_inner())
        .unwrap_or_default()
        .photo_url
        .filter(|url| !url.trim().is_empty());

    let record = engine
        .mark_attendance(employee_id, AttendanceStatus::Present, engine.today(), photo_url)
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Mark attendance for an employee and date (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{employee_id}/{date}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ("date" = String, Path, description = "Day in YYYY-MM-DD")
    ),
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Invalid status or date"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    path: web::Path<(u64, String)>,
    payload: web::Json<MarkRequest>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    auth.require_hr_or_admin()?;

    let (employee_id, raw_date) = path.into_inner();
    let date = parse_date(&raw_date)?;

    let record = engine
        .mark_attendance(employee_id, payload.status, date, None)
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Convert a day into an excused leave (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{employee_id}/{date}/correction",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ("date" = String, Path, description = "Day in YYYY-MM-DD")
    ),
    request_body = CorrectionRequest,
    responses(
        (status = 200, description = "Attendance corrected", body = AttendanceRecord),
        (status = 400, description = "Invalid status or date"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn correct<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    path: web::Path<(u64, String)>,
    payload: web::Json<CorrectionRequest>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    auth.require_hr_or_admin()?;

    let (employee_id, raw_date) = path.into_inner();
    let date = parse_date(&raw_date)?;
    let CorrectionRequest { status, note } = payload.into_inner();

    let record = engine.correct_status(employee_id, date, status, note).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Verdict for one employee and day
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/{date}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ("date" = String, Path, description = "Day in YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Persisted or synthetic verdict", body = DayEntryView),
        (status = 204, description = "Day has not concluded yet"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn day<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    path: web::Path<(u64, String)>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    let (employee_id, raw_date) = path.into_inner();
    auth.require_access_to(employee_id)?;
    let date = parse_date(&raw_date)?;

    Ok(match engine.day_verdict(employee_id, date).await? {
        Some(entry) => {
            HttpResponse::Ok().json(DayEntryView::new(employee_id, entry, engine.policy()))
        }
        None => HttpResponse::NoContent().finish(),
    })
}

/// Gap-free month, most recent day first
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/month",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Reconstructed month", body = MonthlyAttendanceResponse),
        (status = 400, description = "Month or year out of range"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn month<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;

    let entries = engine
        .reconstruct_month(employee_id, query.month, query.year)
        .await?;
    let employee = engine.employee(employee_id).await?;
    let summary = summarize(&entries, engine.policy());

    Ok(HttpResponse::Ok().json(MonthlyAttendanceResponse {
        employee,
        month: query.month,
        year: query.year,
        summary,
        days: entries
            .into_iter()
            .map(|entry| DayEntryView::new(employee_id, entry, engine.policy()))
            .collect(),
    }))
}

/// Fleet-wide counts for a day (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Daily counts", body = DailyStats),
        (status = 400, description = "Malformed date"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn stats<S>(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine<S>>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, AppError>
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    auth.require_hr_or_admin()?;

    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => engine.today(),
    };

    Ok(HttpResponse::Ok().json(engine.daily_stats(date).await?))
}
