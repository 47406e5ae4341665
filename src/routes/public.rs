//! Public site routes. Each listed entity gets its own nested router so static
//! aliases (`/api/projects/public`) never compete with another entity's `:id`.

use crate::handlers::public::{self, PublicSegment};
use crate::handlers::{theme, upload};
use crate::state::AppState;
use axum::{routing::get, Extension, Router};

fn entity_router(segment: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(public::list))
        .route("/:id", get(public::read))
        .route("/:id/:sub", get(public::nested))
        .layer(Extension(PublicSegment(segment.to_string())))
}

pub fn public_routes(state: AppState) -> Router {
    let mut router = Router::new();
    for entity in state.model.entities.iter().filter(|e| e.public.is_some()) {
        router = router.nest(&format!("/api/{}", entity.path_segment), entity_router(&entity.path_segment));
    }
    router
        .route("/api/theme-settings", get(theme::get_status).post(theme::set_enabled))
        .route("/api/cloud/files/:file_id", get(upload::serve_file))
        .with_state(state)
}
