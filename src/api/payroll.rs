use actix_web::{HttpResponse, web};
use hrm_sync::{AppContext, RepoError};
use hrm_sync::model::PayrollRecord;
use hrm_sync::repository::PayrollInput;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = "k3J9x0pQ")]
    pub employee_id: String,

    #[schema(example = 3)]
    pub month: u32,

    #[schema(example = 2026)]
    pub year: i32,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub bonuses: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = 6000.0)]
    pub bonuses: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 3)]
    pub month: Option<u32>,

    #[schema(example = 2026)]
    pub year: Option<i32>,

    /// Admins only; everyone else sees their own records
    #[schema(example = "k3J9x0pQ")]
    pub employee_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct PeriodQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<PayrollRecord>,
    pub total: usize,
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll generated from the month's attendance", body = Object),
        (status = 400, description = "Invalid period or salary"),
        (status = 409, description = "Payroll already generated for this period"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<CreatePayroll>,
) -> ApiResult {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let employee = ctx.employees.get(&payload.employee_id).await?;
    let attendance = ctx
        .reports
        .attendance_month_summary(&employee.id, payload.month, payload.year)
        .await?;
    let record = ctx
        .payroll
        .generate(
            &employee,
            PayrollInput {
                month: payload.month,
                year: payload.year,
                base_salary: payload.base_salary,
                bonuses: payload.bonuses.unwrap_or(0.0),
            },
            &attendance,
        )
        .await?;

    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll adjusted", body = Object),
        (status = 400, description = "Payroll already paid"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    payload: web::Json<UpdatePayroll>,
) -> ApiResult {
    auth.require_admin()?;
    let record = ctx
        .payroll
        .adjust(&path, payload.bonuses, payload.deductions)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}/paid",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll marked paid", body = Object),
        (status = 400, description = "Payroll already paid"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn mark_paid(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    let record = ctx.payroll.mark_paid(&path).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = Object),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    let record = ctx.payroll.records().require(&path).await?;
    auth.require_self_or_admin(&record.employee_id)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PayrollListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<PayrollQuery>,
) -> ApiResult {
    let records = if auth.role.is_admin() {
        match (&query.employee_id, query.month, query.year) {
            (Some(employee_id), _, _) => ctx.payroll.for_employee(employee_id).await?,
            (None, Some(month), Some(year)) => ctx.payroll.for_period(month, year).await?,
            _ => {
                return Err(RepoError::Validation(
                    "either employee_id or month and year are required".into(),
                )
                .into());
            }
        }
    } else {
        let mut own = ctx.payroll.for_employee(auth.employee()?).await?;
        if let (Some(month), Some(year)) = (query.month, query.year) {
            own.retain(|r| r.month == month && r.year == year);
        }
        own
    };

    Ok(HttpResponse::Ok().json(PayrollListResponse {
        total: records.len(),
        data: records,
    }))
}

/// Totals for one month
#[utoipa::path(
    get,
    path = "/api/payroll/summary",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Payroll totals for the period", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payroll_summary(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<PeriodQuery>,
) -> ApiResult {
    auth.require_admin()?;
    let summary = ctx.reports.payroll_summary(query.month, query.year).await?;
    Ok(HttpResponse::Ok().json(summary))
}
