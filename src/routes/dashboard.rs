//! Admin-only routes: dashboard JSON API, form actions and media mutations.

use crate::extractors::require_admin;
use crate::handlers::{entity, forms, upload};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn dashboard_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard/:entity", get(entity::list).post(entity::create))
        .route(
            "/api/dashboard/:entity/:id",
            get(entity::read).patch(entity::update).delete(entity::delete),
        )
        .route(
            "/api/dashboard/:entity/:id/galleries",
            get(entity::galleries).put(entity::replace_galleries),
        )
        .route("/dashboard/:entity/:action", post(forms::create))
        .route("/dashboard/:entity/:id/:action", post(forms::act))
        .route("/api/cloud/upload", post(upload::upload))
        .route("/api/delete-image", post(upload::delete_image))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}
