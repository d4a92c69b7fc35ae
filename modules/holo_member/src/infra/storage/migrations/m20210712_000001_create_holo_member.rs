use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

use crate::contract::model::GenerationType;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Refreshes `updated_at` on every row update, never below `created_at`.
const CREATE_TRIGGER_FN: &str = r#"
CREATE OR REPLACE FUNCTION update_updated_at_column()
    RETURNS TRIGGER AS
$$
BEGIN
    NEW.updated_at = GREATEST(now(), NEW.created_at);
    RETURN NEW;
END;
$$ language 'plpgsql';
"#;

const CREATE_TRIGGER: &str = r#"
CREATE TRIGGER update_holo_member_modtime
    BEFORE UPDATE
    ON holo_member
    FOR EACH ROW
EXECUTE PROCEDURE update_updated_at_column();
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let types: Vec<&str> = GenerationType::ALL.iter().map(|g| g.as_str()).collect();

        manager
            .create_table(
                Table::create()
                    .table(HoloMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HoloMember::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HoloMember::Type)
                            .text()
                            .not_null()
                            .check(Expr::col(HoloMember::Type).is_in(types)),
                    )
                    .col(ColumnDef::new(HoloMember::Name).text().not_null())
                    .col(
                        ColumnDef::new(HoloMember::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(HoloMember::Twitter).text().not_null())
                    .col(
                        ColumnDef::new(HoloMember::Age)
                            .decimal_len(10, 1)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HoloMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(HoloMember::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_holo_member_name")
                    .table(HoloMember::Table)
                    .col(HoloMember::Name)
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == DbBackend::Postgres {
            let db = manager.get_connection();
            db.execute_unprepared(CREATE_TRIGGER_FN).await?;
            db.execute_unprepared(CREATE_TRIGGER).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() == DbBackend::Postgres {
            let db = manager.get_connection();
            db.execute_unprepared("DROP TRIGGER IF EXISTS update_holo_member_modtime ON holo_member")
                .await?;
            db.execute_unprepared("DROP FUNCTION IF EXISTS update_updated_at_column")
                .await?;
        }

        manager
            .drop_table(Table::drop().table(HoloMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HoloMember {
    Table,
    Id,
    Type,
    Name,
    Description,
    Twitter,
    Age,
    CreatedAt,
    UpdatedAt,
}
