use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::StoreError;
use crate::entities::courses;

#[derive(Debug, Clone)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub credit_hours: f64,
}

pub struct CourseRepository {
    conn: DatabaseConnection,
}

impl CourseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<courses::Model>, StoreError> {
        let courses = courses::Entity::find()
            .order_by_asc(courses::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(courses)
    }

    pub async fn get(&self, id: i64) -> Result<Option<courses::Model>, StoreError> {
        let course = courses::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(course)
    }

    pub async fn create(&self, input: CourseInput) -> Result<courses::Model, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = courses::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            credit_hours: Set(input.credit_hours),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        let course = active.insert(&self.conn).await?;
        Ok(course)
    }

    pub async fn update(
        &self,
        id: i64,
        version: i32,
        input: CourseInput,
    ) -> Result<courses::Model, StoreError> {
        let active = courses::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            credit_hours: Set(input.credit_hours),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = courses::Entity::update_many()
            .set(active)
            .col_expr(
                courses::Column::Version,
                Expr::col(courses::Column::Version).add(1),
            )
            .filter(courses::Column::Id.eq(id))
            .filter(courses::Column::Version.eq(version))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        self.get(id).await?.ok_or(StoreError::RecordNotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = courses::Entity::delete_by_id(id).exec(&self.conn).await?;

        if res.rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }

        Ok(())
    }
}
