use axum::{Router, middleware, routing::post};

use super::handlers::{import_detected, import_workbook};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/", post(import_detected))
        .route("/:kind", post(import_workbook))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
