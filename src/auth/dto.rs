use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::claims::Role;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

/// Request body for OTP verification. Fields are optional so a missing one
/// yields our 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub user_id: Option<String>,
    pub otp: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity attached to a session, as carried by the token claims.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_response_uses_camel_case_user_id() {
        let response = RegisterResponse {
            message: "ok".into(),
            user_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("userId"));
    }

    #[test]
    fn session_user_serializes_role_lowercase() {
        let user = SessionUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            role: Role::Admin,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"role\":\"admin\""));
    }
}
