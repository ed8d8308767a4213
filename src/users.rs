use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{claims::Role, extractors::AuthSession, repo::User},
    error::ApiError,
    state::AppState,
};

/// User projection for the admin listing; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

#[instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    if !session.is_admin() {
        return Err(ApiError::Forbidden(
            "Access denied. Admin role required.".into(),
        ));
    }
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_leaks_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "super-secret-hash".into(),
            role: Role::User,
            is_verified: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(!json.contains("super-secret-hash"));
        assert!(json.contains("alice"));
    }
}
