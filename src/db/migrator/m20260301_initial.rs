use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Every permission code the API gates on. Grants reference these rows,
/// so the full set is seeded up front.
const PERMISSION_CODES: &[&str] = &[
    "officers:read",
    "officers:write",
    "courses:read",
    "courses:write",
    "nits:read",
    "nits:write",
    "facilitators:read",
    "facilitators:write",
    "feedback:read",
    "feedback:write",
    "permissions:write",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Permissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserPermissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Personnel)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Courses)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TrainingSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Facilitators)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SessionFacilitators)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SessionEnrollment)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(FacilitatorRatings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CourseRatings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Token lookups filter on user_id during bulk revocation
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tokens_user_id")
                    .table(Tokens)
                    .col(crate::entities::tokens::Column::UserId)
                    .to_owned(),
            )
            .await?;

        // Seed the permission catalogue
        let mut insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Permissions)
            .columns([crate::entities::permissions::Column::Code])
            .to_owned();

        for code in PERMISSION_CODES {
            insert.values_panic([(*code).into()]);
        }

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseRatings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FacilitatorRatings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SessionEnrollment).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SessionFacilitators).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Facilitators).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrainingSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Personnel).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserPermissions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
