use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};
use hrm_sync::model::Role;

use crate::api::ApiError;

/// Caller identity, put in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin only".into()))
        }
    }

    /// The linked employee record, required for self-service endpoints.
    pub fn employee(&self) -> Result<&str, ApiError> {
        self.employee_id
            .as_deref()
            .ok_or_else(|| ApiError::Forbidden("No employee profile".into()))
    }

    /// Admins may act on anyone; others only on their own employee record.
    pub fn require_self_or_admin(&self, employee_id: &str) -> Result<(), ApiError> {
        if self.role.is_admin() || self.employee_id.as_deref() == Some(employee_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Not your record".into()))
        }
    }
}
