use sea_orm::entity::prelude::*;

/// Stored side of an opaque bearer token. Only the SHA-256 digest of the
/// plaintext is persisted; the plaintext itself is returned to the caller
/// once at issuance and never stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    /// Hex-encoded SHA-256 digest of the token plaintext.
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,

    pub user_id: i64,

    /// Absolute expiry, Unix epoch seconds.
    pub expiry: i64,

    /// Token scope tag ("activation" or "authentication").
    pub scope: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
