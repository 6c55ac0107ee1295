use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "personnel")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub regulation_number: String,

    pub first_name: String,

    pub last_name: String,

    pub sex: String,

    pub rank_id: Option<i64>,

    pub formation_id: Option<i64>,

    pub posting_id: Option<i64>,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,

    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
