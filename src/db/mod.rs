use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::entities::{
    course_ratings, courses, facilitator_ratings, facilitators, personnel, session_enrollment,
    tokens, training_sessions, users,
};

pub mod migrator;
pub mod repositories;

pub use repositories::course::CourseInput;
pub use repositories::facilitator::FacilitatorInput;
pub use repositories::officer::OfficerInput;
pub use repositories::session::SessionInput;

/// Every database statement runs under this deadline so a stalled
/// connection cannot hold a request open indefinitely.
const STATEMENT_DEADLINE: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    RecordNotFound,

    /// The row's version no longer matched the one the caller read.
    #[error("edit conflict")]
    EditConflict,

    #[error("a user with this email address already exists")]
    DuplicateEmail,

    #[error("duplicate {0}")]
    DuplicateKey(&'static str),

    #[error("database operation timed out")]
    Timeout,

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

async fn bounded<T>(fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
    match tokio::time::timeout(STATEMENT_DEADLINE, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout),
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // An in-memory sqlite database exists per connection, so the pool
        // must stay at a single connection or the schema vanishes.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn permission_repo(&self) -> repositories::permission::PermissionRepository {
        repositories::permission::PermissionRepository::new(self.conn.clone())
    }

    fn officer_repo(&self) -> repositories::officer::OfficerRepository {
        repositories::officer::OfficerRepository::new(self.conn.clone())
    }

    fn course_repo(&self) -> repositories::course::CourseRepository {
        repositories::course::CourseRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn facilitator_repo(&self) -> repositories::facilitator::FacilitatorRepository {
        repositories::facilitator::FacilitatorRepository::new(self.conn.clone())
    }

    fn enrollment_repo(&self) -> repositories::enrollment::EnrollmentRepository {
        repositories::enrollment::EnrollmentRepository::new(self.conn.clone())
    }

    fn feedback_repo(&self) -> repositories::feedback::FeedbackRepository {
        repositories::feedback::FeedbackRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model, StoreError> {
        bounded(self.user_repo().create(email, password_hash)).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>, StoreError> {
        bounded(self.user_repo().get_by_email(email)).await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<users::Model>, StoreError> {
        bounded(self.user_repo().get_by_id(id)).await
    }

    pub async fn activate_user(&self, id: i64, version: i32) -> Result<users::Model, StoreError> {
        bounded(self.user_repo().activate(id, version)).await
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    pub async fn insert_token(&self, token: tokens::Model) -> Result<(), StoreError> {
        bounded(self.token_repo().insert(token)).await
    }

    pub async fn get_user_for_token(
        &self,
        hash: &str,
        scope: &str,
    ) -> Result<Option<users::Model>, StoreError> {
        let now = chrono::Utc::now().timestamp();
        bounded(self.token_repo().get_user_for_token(hash, scope, now)).await
    }

    pub async fn delete_all_tokens_for_user(
        &self,
        scope: &str,
        user_id: i64,
    ) -> Result<u64, StoreError> {
        bounded(self.token_repo().delete_all_for_user(scope, user_id)).await
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    pub async fn get_permission_by_code(
        &self,
        code: &str,
    ) -> Result<Option<crate::entities::permissions::Model>, StoreError> {
        bounded(self.permission_repo().get_by_code(code)).await
    }

    pub async fn grant_permission(
        &self,
        user_id: i64,
        permission_id: i64,
    ) -> Result<(), StoreError> {
        bounded(self.permission_repo().grant(user_id, permission_id)).await
    }

    pub async fn permission_codes_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<String>, StoreError> {
        bounded(self.permission_repo().codes_for_user(user_id)).await
    }

    pub async fn user_has_permission(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<bool, StoreError> {
        bounded(self.permission_repo().user_has_permission(user_id, code)).await
    }

    // ------------------------------------------------------------------
    // Officers
    // ------------------------------------------------------------------

    pub async fn list_officers(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<personnel::Model>, u64), StoreError> {
        bounded(self.officer_repo().list(page, page_size)).await
    }

    pub async fn get_officer(&self, id: i64) -> Result<Option<personnel::Model>, StoreError> {
        bounded(self.officer_repo().get(id)).await
    }

    pub async fn create_officer(
        &self,
        input: OfficerInput,
    ) -> Result<personnel::Model, StoreError> {
        bounded(self.officer_repo().create(input)).await
    }

    pub async fn update_officer(
        &self,
        id: i64,
        version: i32,
        input: OfficerInput,
    ) -> Result<personnel::Model, StoreError> {
        bounded(self.officer_repo().update(id, version, input)).await
    }

    pub async fn delete_officer(&self, id: i64) -> Result<(), StoreError> {
        bounded(self.officer_repo().delete(id)).await
    }

    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    pub async fn list_courses(&self) -> Result<Vec<courses::Model>, StoreError> {
        bounded(self.course_repo().list()).await
    }

    pub async fn get_course(&self, id: i64) -> Result<Option<courses::Model>, StoreError> {
        bounded(self.course_repo().get(id)).await
    }

    pub async fn create_course(&self, input: CourseInput) -> Result<courses::Model, StoreError> {
        bounded(self.course_repo().create(input)).await
    }

    pub async fn update_course(
        &self,
        id: i64,
        version: i32,
        input: CourseInput,
    ) -> Result<courses::Model, StoreError> {
        bounded(self.course_repo().update(id, version, input)).await
    }

    pub async fn delete_course(&self, id: i64) -> Result<(), StoreError> {
        bounded(self.course_repo().delete(id)).await
    }

    // ------------------------------------------------------------------
    // Training sessions
    // ------------------------------------------------------------------

    pub async fn list_sessions(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<training_sessions::Model>, u64), StoreError> {
        bounded(self.session_repo().list(page, page_size)).await
    }

    pub async fn get_session(
        &self,
        id: i64,
    ) -> Result<Option<training_sessions::Model>, StoreError> {
        bounded(self.session_repo().get(id)).await
    }

    pub async fn create_session(
        &self,
        input: SessionInput,
    ) -> Result<training_sessions::Model, StoreError> {
        bounded(self.session_repo().create(input)).await
    }

    pub async fn update_session(
        &self,
        id: i64,
        version: i32,
        input: SessionInput,
    ) -> Result<training_sessions::Model, StoreError> {
        bounded(self.session_repo().update(id, version, input)).await
    }

    pub async fn delete_session(&self, id: i64) -> Result<(), StoreError> {
        bounded(self.session_repo().delete(id)).await
    }

    // ------------------------------------------------------------------
    // Facilitators
    // ------------------------------------------------------------------

    pub async fn list_facilitators(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<facilitators::Model>, u64), StoreError> {
        bounded(self.facilitator_repo().list(page, page_size)).await
    }

    pub async fn get_facilitator(
        &self,
        id: i64,
    ) -> Result<Option<facilitators::Model>, StoreError> {
        bounded(self.facilitator_repo().get(id)).await
    }

    pub async fn create_facilitator(
        &self,
        input: FacilitatorInput,
    ) -> Result<facilitators::Model, StoreError> {
        bounded(self.facilitator_repo().create(input)).await
    }

    pub async fn update_facilitator(
        &self,
        id: i64,
        version: i32,
        input: FacilitatorInput,
    ) -> Result<facilitators::Model, StoreError> {
        bounded(self.facilitator_repo().update(id, version, input)).await
    }

    pub async fn delete_facilitator(&self, id: i64) -> Result<(), StoreError> {
        bounded(self.facilitator_repo().delete(id)).await
    }

    pub async fn list_session_facilitators(
        &self,
        session_id: i64,
    ) -> Result<Vec<facilitators::Model>, StoreError> {
        bounded(self.facilitator_repo().list_for_session(session_id)).await
    }

    pub async fn assign_facilitator(
        &self,
        session_id: i64,
        facilitator_id: i64,
    ) -> Result<(), StoreError> {
        bounded(
            self.facilitator_repo()
                .assign_to_session(session_id, facilitator_id),
        )
        .await
    }

    pub async fn remove_facilitator_from_session(
        &self,
        session_id: i64,
        facilitator_id: i64,
    ) -> Result<(), StoreError> {
        bounded(
            self.facilitator_repo()
                .remove_from_session(session_id, facilitator_id),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Enrollments & feedback
    // ------------------------------------------------------------------

    pub async fn create_enrollment(
        &self,
        session_id: i64,
        personnel_id: i64,
    ) -> Result<session_enrollment::Model, StoreError> {
        bounded(self.enrollment_repo().create(session_id, personnel_id)).await
    }

    pub async fn get_enrollment(
        &self,
        id: i64,
    ) -> Result<Option<session_enrollment::Model>, StoreError> {
        bounded(self.enrollment_repo().get(id)).await
    }

    pub async fn list_enrollments_for_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<session_enrollment::Model>, StoreError> {
        bounded(self.enrollment_repo().list_for_session(session_id)).await
    }

    pub async fn insert_facilitator_rating(
        &self,
        facilitator_id: i64,
        session_enrollment_id: i64,
        score: i32,
        comment: String,
    ) -> Result<facilitator_ratings::Model, StoreError> {
        bounded(self.feedback_repo().insert_facilitator_rating(
            facilitator_id,
            session_enrollment_id,
            score,
            comment,
        ))
        .await
    }

    pub async fn list_facilitator_ratings(
        &self,
        facilitator_id: i64,
    ) -> Result<Vec<facilitator_ratings::Model>, StoreError> {
        bounded(self.feedback_repo().list_for_facilitator(facilitator_id)).await
    }

    pub async fn insert_course_rating(
        &self,
        session_enrollment_id: i64,
        score: i32,
        comment: String,
    ) -> Result<course_ratings::Model, StoreError> {
        bounded(
            self.feedback_repo()
                .insert_course_rating(session_enrollment_id, score, comment),
        )
        .await
    }

    pub async fn list_course_ratings(
        &self,
        course_id: i64,
    ) -> Result<Vec<course_ratings::Model>, StoreError> {
        bounded(self.feedback_repo().list_for_course(course_id)).await
    }
}
