use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::db::StoreError;
use crate::entities::{facilitators, session_facilitators};

#[derive(Debug, Clone)]
pub struct FacilitatorInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub personnel_id: Option<i64>,
}

pub struct FacilitatorRepository {
    conn: DatabaseConnection,
}

impl FacilitatorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<facilitators::Model>, u64), StoreError> {
        let paginator = facilitators::Entity::find()
            .order_by_asc(facilitators::Column::Id)
            .paginate(&self.conn, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i64) -> Result<Option<facilitators::Model>, StoreError> {
        let facilitator = facilitators::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(facilitator)
    }

    pub async fn create(
        &self,
        input: FacilitatorInput,
    ) -> Result<facilitators::Model, StoreError> {
        let active = facilitators::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            personnel_id: Set(input.personnel_id),
            version: Set(1),
            ..Default::default()
        };

        let facilitator = active.insert(&self.conn).await?;
        Ok(facilitator)
    }

    pub async fn update(
        &self,
        id: i64,
        version: i32,
        input: FacilitatorInput,
    ) -> Result<facilitators::Model, StoreError> {
        let active = facilitators::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            personnel_id: Set(input.personnel_id),
            ..Default::default()
        };

        let res = facilitators::Entity::update_many()
            .set(active)
            .col_expr(
                facilitators::Column::Version,
                Expr::col(facilitators::Column::Version).add(1),
            )
            .filter(facilitators::Column::Id.eq(id))
            .filter(facilitators::Column::Version.eq(version))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        self.get(id).await?.ok_or(StoreError::RecordNotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = facilitators::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }

        Ok(())
    }

    /// Facilitators assigned to one session, through the join table.
    pub async fn list_for_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<facilitators::Model>, StoreError> {
        let rows = session_facilitators::Entity::find()
            .filter(session_facilitators::Column::SessionId.eq(session_id))
            .find_also_related(facilitators::Entity)
            .all(&self.conn)
            .await?;

        let mut facilitators: Vec<facilitators::Model> = rows
            .into_iter()
            .filter_map(|(_, facilitator)| facilitator)
            .collect();
        facilitators.sort_by_key(|f| f.id);

        Ok(facilitators)
    }

    /// Assign a facilitator to a session. Re-assigning is reported as a
    /// duplicate so the handler can surface a conflict.
    pub async fn assign_to_session(
        &self,
        session_id: i64,
        facilitator_id: i64,
    ) -> Result<(), StoreError> {
        let active = session_facilitators::ActiveModel {
            session_id: Set(session_id),
            facilitator_id: Set(facilitator_id),
        };

        let res = session_facilitators::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    session_facilitators::Column::SessionId,
                    session_facilitators::Column::FacilitatorId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match res {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotInserted) => Err(StoreError::DuplicateKey("assignment")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_from_session(
        &self,
        session_id: i64,
        facilitator_id: i64,
    ) -> Result<(), StoreError> {
        let res = session_facilitators::Entity::delete_many()
            .filter(session_facilitators::Column::SessionId.eq(session_id))
            .filter(session_facilitators::Column::FacilitatorId.eq(facilitator_id))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::RecordNotFound);
        }

        Ok(())
    }
}
