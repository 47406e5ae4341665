//! Router assembly.

mod auth;
mod common;
mod dashboard;
mod public;

pub use auth::auth_routes;
pub use common::common_routes;
pub use dashboard::dashboard_routes;
pub use public::public_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// The whole application: common, auth, public and admin routes with body limit and request tracing.
pub fn app(state: AppState) -> Router {
    let body_limit = state.settings.max_upload_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(auth_routes(state.clone()))
        .merge(public_routes(state.clone()))
        .merge(dashboard_routes(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
}
