use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "session_facilitators")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub facilitator_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::training_sessions::Entity",
        from = "Column::SessionId",
        to = "super::training_sessions::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::facilitators::Entity",
        from = "Column::FacilitatorId",
        to = "super::facilitators::Column::Id"
    )]
    Facilitator,
}

impl Related<super::facilitators::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facilitator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
