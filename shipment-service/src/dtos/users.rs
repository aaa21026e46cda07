use crate::models::{Role, User};
use serde::{Deserialize, Serialize};

use super::shipments::iso_millis;

/// Wire form of an account. Carries no password field.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: String,
}

impl UserView {
    pub const FIELDS: [&'static str; 5] = ["id", "email", "name", "role", "createdAt"];
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: iso_millis(user.created_at),
        }
    }
}

/// Session issued by `login` and `demoLogin`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DemoLoginArgs {
    pub role: String,
}
