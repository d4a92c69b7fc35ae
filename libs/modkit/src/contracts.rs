use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;

use crate::api::OpenApiRegistry;

/// Module owning tables: brings its schema up to date.
#[async_trait]
pub trait DbModule: Send + Sync {
    /// Runs before any REST route is served.
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// Pure wiring; must be sync. Runs after DB migrations.
pub trait RestfulModule: Send + Sync {
    /// Attach this module's routes to `router`, describing each one to `openapi`.
    fn register_rest(
        &self,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router>;
}
