use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A course rating is keyed to the enrollment that produced it; the course
/// itself is reached by joining through the enrollment's session.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "course_ratings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub session_enrollment_id: i64,

    /// 1 to 5 inclusive.
    pub score: i32,

    pub comment: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session_enrollment::Entity",
        from = "Column::SessionEnrollmentId",
        to = "super::session_enrollment::Column::Id"
    )]
    Enrollment,
}

impl Related<super::session_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
