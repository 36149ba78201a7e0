//! Authentication payloads.

use serde::{Deserialize, Serialize};

use crate::types::{Email, Role, UserId};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

impl RegisterRequest {
    /// Minimum password length accepted by the backend.
    pub const MIN_PASSWORD_LENGTH: usize = 6;
}

/// Successful login or registration result.
///
/// The backend calls the credential `token`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "token", alias = "credential")]
    pub credential: String,
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("credential", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}
