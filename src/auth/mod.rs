use axum::Router;

use crate::state::AuthState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AuthState> {
    handlers::auth_routes()
}
