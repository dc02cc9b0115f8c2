use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Role {
    #[serde(rename = "USER")]
    #[strum(serialize = "USER")]
    User,
    #[serde(rename = "ADMIN")]
    #[strum(serialize = "ADMIN")]
    Admin,
}

impl Role {
    /// Parses the role string carried by a session token.
    pub fn from_claim(value: &str) -> Option<Self> {
        value.trim().to_ascii_uppercase().parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn claim_strings_round_trip_through_display() {
        assert_eq!(Role::from_claim("admin"), Some(Role::Admin));
        assert_eq!(Role::from_claim(" USER "), Some(Role::User));
        assert_eq!(Role::from_claim("hr"), None);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
