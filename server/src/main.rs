//! Atelier server: loads settings, prepares the schema and admin account, serves the API.
//!
//! Run from repo root: `cargo run -p atelier-server`

use atelier_cms::{
    app, apply_migrations, build_model, ensure_admin, ensure_database_exists, AppState, S3Store, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("atelier_cms=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;

    let model = build_model();
    apply_migrations(&pool, &model).await?;
    if let Some((email, password)) = &settings.admin {
        ensure_admin(&pool, email, password).await?;
    }

    let storage = Arc::new(S3Store::connect(&settings.storage).await);
    let bind_addr = settings.bind_addr.clone();
    let state = AppState::new(pool, model, storage, settings);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
