use actix_web::{HttpResponse, web};
use chrono::Utc;
use hrm_sync::AppContext;
use hrm_sync::model::{LeaveRequest, LeaveStatus, LeaveType, day_start};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "Casual Leave", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy")]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Admins only: list this employee's requests
    pub employee_id: Option<String>,
    /// Admins only: `true` lists the pending review queue
    pub pending: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<LeaveFilter>,
) -> ApiResult {
    let requests = if auth.role.is_admin() {
        match (&query.employee_id, query.pending.unwrap_or(false)) {
            (Some(employee_id), _) => ctx.leave.for_employee(employee_id).await?,
            (None, true) => ctx.leave.pending().await?,
            (None, false) => ctx.leave.records().query(&ctx.leave.records().query_all()).await?,
        }
    } else {
        ctx.leave.for_employee(auth.employee()?).await?
    };

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        total: requests.len(),
        data: requests,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(("id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request", body = Object),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    let request = ctx.leave.records().require(&path).await?;
    auth.require_self_or_admin(&request.employee_id)?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = Object),
        (status = 400, description = "End date before start date")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<CreateLeave>,
) -> ApiResult {
    let employee = ctx.employees.get(auth.employee()?).await?;
    let payload = payload.into_inner();

    let request = ctx
        .leave
        .submit(LeaveRequest {
            id: String::new(),
            employee_id: employee.id,
            employee_name: employee.name,
            leave_type: payload.leave_type,
            start_date: day_start(payload.start_date),
            end_date: day_start(payload.end_date),
            reason: payload.reason,
            status: LeaveStatus::Pending,
            applied_date: Utc::now(),
            reviewer_id: None,
            reviewed_date: None,
            reviewer_comments: None,
        })
        .await?;
    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id", Path, description = "Leave request id")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Approved", body = Object),
        (status = 400, description = "Request is no longer pending"),
        (status = 409, description = "Reviewed concurrently by someone else")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    body: web::Json<ReviewLeave>,
) -> ApiResult {
    auth.require_admin()?;
    let request = ctx
        .leave
        .approve(&path, &auth.user_id, body.into_inner().comments)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id", Path, description = "Leave request id")),
    request_body = ReviewLeave,
    responses(
        (status = 200, description = "Rejected", body = Object),
        (status = 400, description = "Request is no longer pending"),
        (status = 409, description = "Reviewed concurrently by someone else")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    body: web::Json<ReviewLeave>,
) -> ApiResult {
    auth.require_admin()?;
    let request = ctx
        .leave
        .reject(&path, &auth.user_id, body.into_inner().comments)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/cancel",
    params(("id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Cancelled", body = Object),
        (status = 400, description = "Request is no longer pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    let request = ctx.leave.records().require(&path).await?;
    auth.require_self_or_admin(&request.employee_id)?;
    let request = ctx.leave.cancel(&path).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    get,
    path = "/api/leave/balances",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Balance per leave type for the current year", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<LeaveFilter>,
) -> ApiResult {
    let employee_id = match &query.employee_id {
        Some(employee_id) => employee_id.as_str(),
        None => auth.employee()?,
    };
    auth.require_self_or_admin(employee_id)?;

    let balances = ctx
        .reports
        .leave_balances(employee_id, Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Ok().json(balances))
}
