use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use hrm_sync::AppContext;
use hrm_sync::model::{ShiftSwapRequest, SwapStatus, day_start};
use serde::Deserialize;
use utoipa::ToSchema;

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct CreateSwap {
    /// Employee whose shift the caller wants to take
    #[schema(example = "k3J9x0pQ")]
    pub target_employee_id: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub requester_shift_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub target_shift_date: NaiveDate,
    #[schema(example = "Doctor's appointment")]
    pub reason: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/shift-swaps",
    request_body = CreateSwap,
    responses(
        (status = 201, description = "Swap requested", body = Object),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn request_swap(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<CreateSwap>,
) -> ApiResult {
    let requester_id = auth.employee()?.to_string();
    let payload = payload.into_inner();

    let request = ctx
        .shifts
        .request_swap(ShiftSwapRequest {
            id: String::new(),
            requester_id,
            target_employee_id: payload.target_employee_id,
            requester_shift_date: day_start(payload.requester_shift_date),
            target_shift_date: day_start(payload.target_shift_date),
            reason: payload.reason.unwrap_or_default(),
            status: SwapStatus::Pending,
            created_at: Utc::now(),
            reviewed_by_id: None,
            reviewed_at: None,
        })
        .await?;
    Ok(HttpResponse::Created().json(request))
}

/// Pending swaps for admins, the caller's own swaps otherwise
#[utoipa::path(
    get,
    path = "/api/shift-swaps",
    responses(
        (status = 200, description = "Swap requests", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn list_swaps(auth: AuthUser, ctx: web::Data<AppContext>) -> ApiResult {
    let swaps = if auth.role.is_admin() {
        ctx.shifts.pending_swaps().await?
    } else {
        ctx.shifts.swaps_for_employee(auth.employee()?).await?
    };
    Ok(HttpResponse::Ok().json(swaps))
}

/// Approve a swap and exchange both assignments atomically
#[utoipa::path(
    put,
    path = "/api/shift-swaps/{id}/approve",
    params(("id", Path, description = "Swap request id")),
    responses(
        (status = 200, description = "Swap applied", body = Object),
        (status = 400, description = "Already processed, or would double-book"),
        (status = 404, description = "Request or one of the assignments is missing"),
        (status = 409, description = "Assignments changed while processing")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn approve_swap(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    let request = ctx
        .coordinator
        .process_shift_swap(&path, &auth.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/shift-swaps/{id}/reject",
    params(("id", Path, description = "Swap request id")),
    responses(
        (status = 200, description = "Swap rejected", body = Object),
        (status = 400, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Shift"
)]
pub async fn reject_swap(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    let request = ctx.shifts.reject_swap(&path, &auth.user_id).await?;
    Ok(HttpResponse::Ok().json(request))
}
