use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, RestfulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes;
use crate::domain::repo::HoloMemberRepository;
use crate::domain::service::Service;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmHoloMemberRepository;

/// The holo_member module: owns the table and serves its REST routes.
#[derive(Clone)]
pub struct HoloMemberModule {
    service: Arc<Service>,
}

impl HoloMemberModule {
    /// Wire the SeaORM repository over `conn`.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self::from_repository(Arc::new(SeaOrmHoloMemberRepository::new(conn)))
    }

    /// Wire an arbitrary repository implementation.
    pub fn from_repository(repo: Arc<dyn HoloMemberRepository>) -> Self {
        Self {
            service: Arc::new(Service::new(repo)),
        }
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }
}

#[async_trait]
impl DbModule for HoloMemberModule {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running holo_member database migrations");
        Migrator::up(db, None).await?;
        info!("holo_member database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for HoloMemberModule {
    fn register_rest(
        &self,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        info!("Registering holo_member REST routes");
        let router = routes::register_routes(router, openapi, self.service.clone())?;
        info!("holo_member REST routes registered successfully");
        Ok(router)
    }
}
