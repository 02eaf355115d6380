use serde::{Deserialize, Serialize};

/// Roles carried in JWT claims issued by the external auth service.
/// This service only reads them; account management lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn from_claim(role: &str) -> UserRole {
        match role {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}
