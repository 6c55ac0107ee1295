use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::StoreError;
use crate::entities::session_enrollment;

pub struct EnrollmentRepository {
    conn: DatabaseConnection,
}

impl EnrollmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        session_id: i64,
        personnel_id: i64,
    ) -> Result<session_enrollment::Model, StoreError> {
        let active = session_enrollment::ActiveModel {
            session_id: Set(session_id),
            personnel_id: Set(personnel_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let enrollment = active.insert(&self.conn).await?;
        Ok(enrollment)
    }

    pub async fn get(&self, id: i64) -> Result<Option<session_enrollment::Model>, StoreError> {
        let enrollment = session_enrollment::Entity::find_by_id(id)
            .one(&self.conn)
            .await?;

        Ok(enrollment)
    }

    pub async fn list_for_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<session_enrollment::Model>, StoreError> {
        let enrollments = session_enrollment::Entity::find()
            .filter(session_enrollment::Column::SessionId.eq(session_id))
            .order_by_asc(session_enrollment::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(enrollments)
    }
}
