use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use hrm_sync::AppContext;
use hrm_sync::model::{Employee, Role, day_start};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "auth-uid-123")]
    pub user_id: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "Backend Engineer")]
    pub designation: String,
    #[schema(example = "USER", value_type = String)]
    pub role: Option<Role>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub joining_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Filter by department
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object),
        (status = 409, description = "Employee code or user already in use", body = Object, example = json!({
            "message": "Employee already exists with userId = auth-uid-123"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult {
    auth.require_admin()?;
    let payload = payload.into_inner();
    let now = Utc::now();

    let employee = ctx
        .employees
        .create_employee(Employee {
            id: String::new(),
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            employee_id: payload.employee_id,
            user_id: payload.user_id,
            department: payload.department,
            designation: payload.designation,
            role: payload.role.unwrap_or(Role::User),
            joining_date: day_start(payload.joining_date),
            added_by: auth.user_id.clone(),
            is_active: true,
            created_at: now,
        })
        .await?;

    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Active employees", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    _auth: AuthUser,
    ctx: web::Data<AppContext>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult {
    let employees = match &query.department {
        Some(department) => ctx.employees.list_by_department(department).await?,
        None => ctx.employees.list_active().await?,
    };

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: employees.len(),
        data: employees,
    }))
}

/// Update Employee
///
/// Partial update; `isActive` is changed through deactivate only.
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee record id")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Object),
        (status = 400, description = "Field cannot be patched", body = Object),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found: abc"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult {
    auth.require_admin()?;
    let employee = ctx.employees.update_employee(&path, &body).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Deactivate Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee record id")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = Object, example = json!({
            "message": "Employee deactivated"
        })),
        (status = 404, description = "Employee not found", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    ctx.employees.deactivate(&path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated"
    })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee record id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Object),
        (status = 404, description = "Employee not found", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_self_or_admin(&path)?;
    let employee = ctx.employees.get(&path).await?;
    Ok(HttpResponse::Ok().json(employee))
}
