use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::db::StoreError;
use crate::entities::users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert an unactivated user. The password must already be hashed.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model, StoreError> {
        let active = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            activated: Set(false),
            personnel_id: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            version: Set(1),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(user) => Ok(user),
            Err(e) => {
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    Err(StoreError::DuplicateEmail)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<users::Model>, StoreError> {
        let user = users::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(user)
    }

    /// Mark the account activated, guarded by the version read earlier.
    /// Zero rows touched means someone else updated the record first.
    pub async fn activate(&self, id: i64, version: i32) -> Result<users::Model, StoreError> {
        let res = users::Entity::update_many()
            .col_expr(users::Column::Activated, Expr::value(true))
            .col_expr(
                users::Column::Version,
                Expr::col(users::Column::Version).add(1),
            )
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::Version.eq(version))
            .exec(&self.conn)
            .await?;

        if res.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        self.get_by_id(id)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }
}
