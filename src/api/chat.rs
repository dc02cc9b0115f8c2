use actix_web::{HttpResponse, web};
use hrm_sync::AppContext;
use serde_json::json;

use super::ApiResult;
use crate::auth::auth::AuthUser;

/// Delete a group with its members and messages
#[utoipa::path(
    delete,
    path = "/api/chat-groups/{id}",
    params(("id", Path, description = "Chat group id")),
    responses(
        (status = 200, description = "Group deleted", body = Object, example = json!({
            "written": 731, "batches": 2
        })),
        (status = 404, description = "Group not found"),
        (status = 503, description = "Stopped part way; the group is kept and the call can be retried")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn delete_group(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    let report = ctx.coordinator.delete_chat_group(&path).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/api/chat-groups",
    responses(
        (status = 200, description = "Active groups the caller belongs to", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn my_groups(auth: AuthUser, ctx: web::Data<AppContext>) -> ApiResult {
    let groups = ctx.chat.groups_for_employee(auth.employee()?).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": groups, "total": groups.len() })))
}
