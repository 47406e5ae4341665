//! Atelier CMS: trilingual content API and admin back office for an architecture studio.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod locale;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod storage;
pub mod theme;

pub use config::{build_model, ResolvedEntity, ResolvedModel, Settings};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, ensure_admin, ensure_database_exists};
pub use response::{success_many, success_one};
pub use routes::{app, auth_routes, common_routes, dashboard_routes, public_routes};
pub use service::CrudService;
pub use state::AppState;
pub use storage::{MemoryStore, ObjectStore, S3Store};
