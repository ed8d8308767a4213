use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::blogs::upload::MAX_IMAGE_BYTES;
use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod upload;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(read_routes())
        .merge(write_routes())
}

fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(handlers::list_blogs))
        .route("/blogs/search", get(handlers::search_blogs))
        .route("/blogs/genre/:genre", get(handlers::blogs_by_genre))
        .route("/blogs/:id", get(handlers::get_blog))
}

fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", post(handlers::create_blog))
        .route("/blogs/:id", put(handlers::update_blog))
        .route("/blogs/:id", delete(handlers::delete_blog))
        .route("/blogs/like/:id", put(handlers::toggle_like))
        .route("/blogs/comment/:id", post(handlers::add_comment))
        .route(
            "/blogs/comment/:id/:commentId",
            delete(handlers::delete_comment),
        )
        .route("/blogs/user/:userId", get(handlers::user_blogs))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024))
}
