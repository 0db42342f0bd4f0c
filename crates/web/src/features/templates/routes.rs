use axum::{Router, routing::get};

use super::handlers::download_template;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:kind", get(download_template))
}
