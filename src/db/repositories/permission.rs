use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use crate::db::StoreError;
use crate::entities::{permissions, user_permissions};

pub struct PermissionRepository {
    conn: DatabaseConnection,
}

impl PermissionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<permissions::Model>, StoreError> {
        let permission = permissions::Entity::find()
            .filter(permissions::Column::Code.eq(code))
            .one(&self.conn)
            .await?;

        Ok(permission)
    }

    /// Grant a permission to a user. Granting an already-held permission
    /// is a no-op, not an error.
    pub async fn grant(&self, user_id: i64, permission_id: i64) -> Result<(), StoreError> {
        let active = user_permissions::ActiveModel {
            user_id: Set(user_id),
            permission_id: Set(permission_id),
        };

        let res = user_permissions::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    user_permissions::Column::UserId,
                    user_permissions::Column::PermissionId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match res {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// All permission codes held by a user, sorted for stable responses.
    pub async fn codes_for_user(&self, user_id: i64) -> Result<Vec<String>, StoreError> {
        let rows = user_permissions::Entity::find()
            .filter(user_permissions::Column::UserId.eq(user_id))
            .find_also_related(permissions::Entity)
            .all(&self.conn)
            .await?;

        let mut codes: Vec<String> = rows
            .into_iter()
            .filter_map(|(_, permission)| permission.map(|p| p.code))
            .collect();
        codes.sort();

        Ok(codes)
    }

    pub async fn user_has_permission(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<bool, StoreError> {
        let Some(permission) = self.get_by_code(code).await? else {
            return Ok(false);
        };

        let held = user_permissions::Entity::find_by_id((user_id, permission.id))
            .one(&self.conn)
            .await?;

        Ok(held.is_some())
    }
}
