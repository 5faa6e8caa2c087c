use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_input: String,
    pub bot_reply: String,
    /// `ok` or `error`.
    pub status: String,
    pub error_kind: Option<String>,
    pub timestamp_us: i64,
}

impl ActiveModelBehavior for ActiveModel {}
