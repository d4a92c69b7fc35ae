use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "holo_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Generation type in its wire form ("0".."5", "EN", "ID", "Gamers").
    #[sea_orm(column_name = "type", column_type = "Text")]
    pub generation: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub twitter: String,
    #[sea_orm(column_type = "Decimal(Some((10, 1)))")]
    pub age: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
