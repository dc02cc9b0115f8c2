use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Session claims issued by the identity provider. Only verified here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Auth identity; notifications are addressed to it.
    pub sub: String,
    /// `USER` or `ADMIN`.
    pub role: String,
    pub exp: usize,

    /// Store id of the linked employee record, if any.
    #[serde(default)]
    pub employee_id: Option<String>,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
