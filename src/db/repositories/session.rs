use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::StoreError;
use crate::entities::training_sessions;

#[derive(Debug, Clone)]
pub struct SessionInput {
    pub course_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<training_sessions::Model>, u64), StoreError> {
        let paginator = training_sessions::Entity::find()
            .order_by_asc(training_sessions::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Option<training_sessions::Model>, StoreError> {
        let session = training_sessions::Entity::find_by_id(id)
            .one(&self.conn)
            .await?;

        Ok(session)
    }

    pub async fn create(
        &self,
        input: SessionInput,
    ) -> Result<training_sessions::Model, StoreError> {
        let active = training_sessions::ActiveModel {
            course_id: Set(input.course_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            location: Set(input.location),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            version: Set(1),
            ..Default::default()
        };

        let session = active.insert(&self.conn).await?;
        Ok(session)
    }

    pub async fn update(
        &self,
        id: i64,
        version: i32,
        input: SessionInput,
    ) -> Result<training_sessions::Model, StoreError> {
        let active = training_sessions::ActiveModel {
            course_id: Set(input.course_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            location: Set(input.location),
            ..Default::default()
        };

        let res = training_sessions::Entity::update_many()
            .set(active)
            .col_expr(
                training_sessions::Column::Version,
                Expr::col(training_sessions::Column::Version).add(1),
            )
            .filter(training_sessions::Column::Id.eq(id))
            .filter(training_sessions::Column::Version.eq(version))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        self.get(id).await?.ok_or(StoreError::RecordNotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = training_sessions::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }

        Ok(())
    }
}
