use actix_web::{HttpResponse, web};
use hrm_sync::AppContext;
use hrm_sync::model::{NotificationTemplate, NotificationType};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use super::ApiResult;
use crate::auth::auth::AuthUser;

#[derive(Deserialize, ToSchema)]
pub struct Broadcast {
    #[schema(example = "Office closed")]
    pub title: String,
    #[schema(example = "The office is closed on Friday.")]
    pub message: String,
    #[schema(example = "Announcement", value_type = String)]
    pub kind: Option<NotificationType>,
    pub related_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = Object)
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn my_notifications(auth: AuthUser, ctx: web::Data<AppContext>) -> ApiResult {
    let notifications = ctx.notifications.for_user(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id", Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read", body = Object),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> ApiResult {
    let notification = ctx.notifications.records().require(&path).await?;
    if notification.user_id != auth.user_id {
        return Err(super::ApiError::Forbidden("Not your notification".into()));
    }
    ctx.notifications.mark_read(&path).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Notification marked read" })))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All unread notifications marked read", body = Object, example = json!({
            "written": 12, "batches": 1
        })),
        (status = 503, description = "Stopped part way; the body reports what was committed")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_all_read(auth: AuthUser, ctx: web::Data<AppContext>) -> ApiResult {
    let report = ctx.coordinator.mark_all_read(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Send one notification to every active employee
#[utoipa::path(
    post,
    path = "/api/notifications/broadcast",
    request_body = Broadcast,
    responses(
        (status = 201, description = "Notifications written", body = Object, example = json!({
            "written": 1200, "batches": 3
        })),
        (status = 503, description = "Stopped part way; the body reports what was committed")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn broadcast(
    auth: AuthUser,
    ctx: web::Data<AppContext>,
    payload: web::Json<Broadcast>,
) -> ApiResult {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let mut template = NotificationTemplate::new(
        payload.kind.unwrap_or(NotificationType::Announcement),
        payload.title,
        payload.message,
    );
    if let Some(related_id) = payload.related_id {
        template = template.related_to(related_id);
    }

    let report = ctx.coordinator.notify_all_active(&template).await?;
    Ok(HttpResponse::Created().json(report))
}
