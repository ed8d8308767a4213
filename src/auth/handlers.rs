use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Role,
        dto::{
            CurrentUserResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
            RegisterResponse, SessionUser, VerifyOtpRequest,
        },
        extractors::{AuthSession, SESSION_COOKIE},
        jwt::JwtKeys,
        otp::{self, OtpRecord},
        password::{hash_password, meets_policy, verify_password},
        repo::User,
    },
    error::ApiError,
    mailer::otp_email_html,
    state::AppState,
};

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::days(state.config.jwt.ttl_days));
    if state.config.production {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }
    cookie
}

#[instrument(skip(state, payload), fields(email))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    tracing::Span::current().record("email", tracing::field::display(&payload.email));
    info!(username = %payload.username, "register attempt");

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!("email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    if !meets_policy(&payload.password) {
        warn!("password validation failed");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters, include 1 uppercase letter, 1 number, and 1 special character.".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;

    let role = if payload.email == state.config.admin_email {
        Role::Admin
    } else {
        Role::User
    };

    let user = User::create(&state.db, &payload.username, &payload.email, &hash, role).await?;

    let code = otp::generate_code();
    let expires_at = OffsetDateTime::now_utc() + otp::OTP_TTL;
    OtpRecord::upsert(&state.db, user.id, &code, expires_at).await?;

    if let Err(e) = state
        .mailer
        .send(&user.email, "Your Verification OTP", &otp_email_html(&code))
        .await
    {
        // The user row stays behind; registration is still surfaced as failed.
        error!(error = %e, user_id = %user.id, "otp email dispatch failed");
        return Err(ApiError::Upstream(
            "Failed to send OTP email. Please try again.".into(),
        ));
    }

    info!(user_id = %user.id, otp_expires_at = %expires_at, "user registered, otp sent");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created! OTP sent to your email.".into(),
            user_id: user.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (user_id, code) = match (payload.user_id, payload.otp) {
        (Some(u), Some(c)) if !u.is_empty() && !c.is_empty() => (u, c),
        _ => {
            return Err(ApiError::Validation("User ID and OTP are required".into()));
        }
    };
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| ApiError::Validation("Invalid user ID format".into()))?;

    let record = OtpRecord::find_for_user(&state.db, user_id).await?;
    let record = match record {
        Some(r) if r.code == code => r,
        _ => {
            warn!(%user_id, "otp mismatch or absent");
            return Err(ApiError::InvalidOtp);
        }
    };

    if record.is_expired(OffsetDateTime::now_utc()) {
        warn!(user_id = %record.user_id, expires_at = %record.expires_at, "otp expired");
        return Err(ApiError::OtpExpired);
    }

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }

    User::mark_verified(&state.db, user_id).await?;
    OtpRecord::delete_for_user(&state.db, user_id).await?;

    info!(%user_id, "user verified");
    Ok(Json(MessageResponse {
        message: "User verified successfully. You can now log in.".into(),
    }))
}

#[instrument(skip(state, payload), fields(email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    tracing::Span::current().record("email", tracing::field::display(&payload.email));

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    if !user.is_verified {
        return Err(ApiError::Forbidden("Please verify your email first".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar.add(session_cookie(&state, token)),
        Json(LoginResponse {
            message: "Login successful".into(),
            user: SessionUser {
                id: user.id,
                username: user.username,
                role: user.role,
            },
        }),
    ))
}

/// Returns the decoded claims as-is; no fresh database read, so the role and
/// verification state may be stale relative to the database.
#[instrument(skip_all)]
pub async fn current_user(session: AuthSession) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user: SessionUser {
            id: session.user_id,
            username: session.username,
            role: session.role,
        },
    })
}

#[instrument(skip_all)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    (
        jar.remove(removal),
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    )
}
