use axum::Router;

use crate::state::EnhanceState;

mod dto;
pub mod engine;
pub mod handlers;
pub mod manager;
pub mod registry;
pub mod weights;

/// Upper bound on the uploaded image itself; checked before any model work.
pub const MAX_IMAGE_SIZE_BYTES: usize = 10 * 1024 * 1024; // 10MB

pub fn router() -> Router<EnhanceState> {
    handlers::enhance_routes()
}
