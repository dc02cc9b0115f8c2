use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use hrm_sync::AppContext;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct AttendanceLocation {
    #[schema(example = "HQ, Floor 3")]
    pub location: String,
}

#[derive(Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Day to report on; defaults to today (UTC)
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub date: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceLocation,
    responses(
        (status = 201, description = "Checked in", body = Object),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "invalid state: employee abc is already checked in on 2026-01-01"
        })),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    body: web::Json<AttendanceLocation>,
) -> ApiResult {
    let employee = ctx.employees.get(auth.employee()?).await?;
    let record = ctx
        .attendance
        .check_in(&employee, &body.location, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = AttendanceLocation,
    responses(
        (status = 200, description = "Checked out", body = Object),
        (status = 404, description = "No active check-in found for today", body = Object),
        (status = 409, description = "Record changed concurrently", body = Object)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    body: web::Json<AttendanceLocation>,
) -> ApiResult {
    let record = ctx
        .attendance
        .check_out(auth.employee()?, &body.location, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Company and per-department attendance for one day
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Attendance rates", body = Object)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_stats(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<StatsQuery>,
) -> ApiResult {
    auth.require_admin()?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let overall = ctx.reports.attendance_for(date).await?;
    let departments = ctx.reports.department_attendance(date).await?;
    Ok(HttpResponse::Ok().json(json!({
        "overall": overall,
        "departments": departments,
    })))
}
