use axum::{routing::get, Router};

use crate::state::AppState;

pub mod cookie;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod otp;
pub mod password;
pub mod token;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api",
        Router::new()
            .merge(handlers::auth_routes())
            .merge(handlers::user_routes())
            .route("/health", get(handlers::health)),
    )
}
