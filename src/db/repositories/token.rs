use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::db::StoreError;
use crate::entities::{tokens, users};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, token: tokens::Model) -> Result<(), StoreError> {
        let active = tokens::ActiveModel {
            hash: Set(token.hash),
            user_id: Set(token.user_id),
            expiry: Set(token.expiry),
            scope: Set(token.scope),
        };

        active.insert(&self.conn).await?;
        Ok(())
    }

    /// Resolve an unexpired token of the given scope to its user. Expired,
    /// wrong-scope and unknown hashes all come back as None; callers must
    /// not be able to tell those apart.
    pub async fn get_user_for_token(
        &self,
        hash: &str,
        scope: &str,
        now: i64,
    ) -> Result<Option<users::Model>, StoreError> {
        let row = tokens::Entity::find()
            .filter(tokens::Column::Hash.eq(hash))
            .filter(tokens::Column::Scope.eq(scope))
            .filter(tokens::Column::Expiry.gt(now))
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await?;

        Ok(row.and_then(|(_, user)| user))
    }

    /// Drop every token a user holds in one scope. Called after activation
    /// so a redeemed activation token cannot be replayed.
    pub async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> Result<u64, StoreError> {
        let res = tokens::Entity::delete_many()
            .filter(tokens::Column::Scope.eq(scope))
            .filter(tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(res.rows_affected)
    }
}
