use sea_orm_migration::prelude::*;

mod m20210712_000001_create_holo_member;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20210712_000001_create_holo_member::Migration)]
    }
}
