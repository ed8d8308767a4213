use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/verify-otp", post(handlers::verify_otp))
        .route("/auth/login", post(handlers::login))
        .route("/auth/current-user", get(handlers::current_user))
        .route("/auth/logout", post(handlers::logout))
}
