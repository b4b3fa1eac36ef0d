use crate::api::attendance::{CheckInRequest, CorrectionRequest, MarkRequest, MonthlyAttendanceResponse};
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, DailyStats, DayEntryView, MonthlySummary,
};
use crate::model::employee::Employee;
use crate::models::{LoginReqDto, LoginResponse};
use crate::service::lateness::{Lateness, Shift};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Ledger API",
        version = "0.1.0",
        description = r#"
## Attendance Ledger & Lateness Engine

Turns raw check-ins into one attendance verdict per employee per day.

### Key Features
- **Check-in** with lateness rounded up to 30 minute buckets
  (09:00 target before noon, 15:00 after)
- **Corrections** that convert an unexcused absence into permission or sick leave
- **Monthly reconstruction** with synthetic `absent_unexcused` days for concluded
  days that have no record
- **Daily stats**: present, late and on-leave counts

### Security
Endpoints under `/api` require a **JWT Bearer** token from `/auth/login`.
Marking for others, corrections and stats require the **HR** or **Admin** role.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::lateness,
        crate::api::attendance::check_in,
        crate::api::attendance::mark,
        crate::api::attendance::correct,
        crate::api::attendance::day,
        crate::api::attendance::month,
        crate::api::attendance::stats,
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            AttendanceStatus,
            AttendanceRecord,
            DayEntryView,
            DailyStats,
            MonthlySummary,
            MonthlyAttendanceResponse,
            Employee,
            Lateness,
            Shift,
            CheckInRequest,
            MarkRequest,
            CorrectionRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuance"),
        (name = "Attendance", description = "Attendance ledger APIs"),
    )
)]
pub struct ApiDoc;
