use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::db::StoreError;
use crate::entities::{course_ratings, facilitator_ratings, session_enrollment, training_sessions};

pub struct FeedbackRepository {
    conn: DatabaseConnection,
}

impl FeedbackRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert_facilitator_rating(
        &self,
        facilitator_id: i64,
        session_enrollment_id: i64,
        score: i32,
        comment: String,
    ) -> Result<facilitator_ratings::Model, StoreError> {
        let active = facilitator_ratings::ActiveModel {
            facilitator_id: Set(facilitator_id),
            session_enrollment_id: Set(session_enrollment_id),
            score: Set(score),
            comment: Set(comment),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let rating = active.insert(&self.conn).await?;
        Ok(rating)
    }

    pub async fn list_for_facilitator(
        &self,
        facilitator_id: i64,
    ) -> Result<Vec<facilitator_ratings::Model>, StoreError> {
        let ratings = facilitator_ratings::Entity::find()
            .filter(facilitator_ratings::Column::FacilitatorId.eq(facilitator_id))
            .order_by_asc(facilitator_ratings::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(ratings)
    }

    pub async fn insert_course_rating(
        &self,
        session_enrollment_id: i64,
        score: i32,
        comment: String,
    ) -> Result<course_ratings::Model, StoreError> {
        let active = course_ratings::ActiveModel {
            session_enrollment_id: Set(session_enrollment_id),
            score: Set(score),
            comment: Set(comment),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let rating = active.insert(&self.conn).await?;
        Ok(rating)
    }

    /// Ratings for a course. Course ratings are stored against enrollments,
    /// so this walks course -> sessions -> enrollments -> ratings.
    pub async fn list_for_course(
        &self,
        course_id: i64,
    ) -> Result<Vec<course_ratings::Model>, StoreError> {
        let session_ids: Vec<i64> = training_sessions::Entity::find()
            .filter(training_sessions::Column::CourseId.eq(course_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if session_ids.is_empty() {
            return Ok(Vec::new());
        }

        let enrollment_ids: Vec<i64> = session_enrollment::Entity::find()
            .filter(session_enrollment::Column::SessionId.is_in(session_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        if enrollment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ratings = course_ratings::Entity::find()
            .filter(course_ratings::Column::SessionEnrollmentId.is_in(enrollment_ids))
            .order_by_asc(course_ratings::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(ratings)
    }
}
