use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::db::StoreError;
use crate::entities::personnel;

/// Fields accepted when creating or replacing an officer record.
#[derive(Debug, Clone)]
pub struct OfficerInput {
    pub regulation_number: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub rank_id: Option<i64>,
    pub formation_id: Option<i64>,
    pub posting_id: Option<i64>,
    pub is_active: bool,
}

pub struct OfficerRepository {
    conn: DatabaseConnection,
}

impl OfficerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<personnel::Model>, u64), StoreError> {
        let paginator = personnel::Entity::find()
            .order_by_asc(personnel::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Option<personnel::Model>, StoreError> {
        let officer = personnel::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(officer)
    }

    pub async fn create(&self, input: OfficerInput) -> Result<personnel::Model, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = personnel::ActiveModel {
            regulation_number: Set(input.regulation_number),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            sex: Set(input.sex),
            rank_id: Set(input.rank_id),
            formation_id: Set(input.formation_id),
            posting_id: Set(input.posting_id),
            is_active: Set(input.is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(officer) => Ok(officer),
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    Err(StoreError::DuplicateKey("regulation_number"))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Conditional update: only applies if the stored version still matches
    /// the one the caller read.
    pub async fn update(
        &self,
        id: i64,
        version: i32,
        input: OfficerInput,
    ) -> Result<personnel::Model, StoreError> {
        let active = personnel::ActiveModel {
            regulation_number: Set(input.regulation_number),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            sex: Set(input.sex),
            rank_id: Set(input.rank_id),
            formation_id: Set(input.formation_id),
            posting_id: Set(input.posting_id),
            is_active: Set(input.is_active),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let res = personnel::Entity::update_many()
            .set(active)
            .col_expr(
                personnel::Column::Version,
                Expr::col(personnel::Column::Version).add(1),
            )
            .filter(personnel::Column::Id.eq(id))
            .filter(personnel::Column::Version.eq(version))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        self.get(id).await?.ok_or(StoreError::RecordNotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = personnel::Entity::delete_by_id(id).exec(&self.conn).await?;

        if res.rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }

        Ok(())
    }
}
