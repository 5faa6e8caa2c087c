use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "moods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub mood: String,
    pub timestamp_us: i64,
}

impl ActiveModelBehavior for ActiveModel {}
