use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "token";

/// Verified session identity for the current request.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthSession {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        // Session cookie first, Bearer header as a fallback for API clients.
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
            Some(t) => t,
            None => parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.to_string())
                .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?,
        };

        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::Unauthorized("Invalid token".into())
        })?;

        Ok(AuthSession {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use crate::state::AppState;
    use axum::http::{header, Request, StatusCode};
    use time::OffsetDateTime;

    fn make_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "hash".into(),
            role: Role::User,
            is_verified: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn missing_token_is_rejected_with_the_expected_message() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let err = AuthSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "No token provided");
    }

    #[tokio::test]
    async fn session_cookie_authenticates() {
        let state = AppState::fake();
        let user = make_user();
        let token = JwtKeys::from_ref(&state).sign(&user).expect("sign");

        let (mut parts, _) = Request::builder()
            .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
            .body(())
            .unwrap()
            .into_parts();

        let session = AuthSession::from_request_parts(&mut parts, &state)
            .await
            .expect("session");
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.username, "alice");
    }

    #[tokio::test]
    async fn garbage_cookie_is_rejected() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder()
            .header(header::COOKIE, format!("{SESSION_COOKIE}=not.a.token"))
            .body(())
            .unwrap()
            .into_parts();

        let err = AuthSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Invalid token");
    }
}
