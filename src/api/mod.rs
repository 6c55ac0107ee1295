use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{LogMailer, Mailer, RateLimiter};

pub mod auth;
mod courses;
mod error;
mod facilitators;
mod feedback;
mod officers;
mod sessions;
mod system;
mod tokens;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    // Outbound mail goes to the log; a real SMTP transport would slot in
    // behind the same trait.
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.smtp.sender.clone()));
    create_app_state_with_mailer(config, mailer).await
}

pub async fn create_app_state_with_mailer(
    config: Config,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<Arc<AppState>> {
    config.validate()?;

    let store = Store::with_pool_options(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;

    let limiter = RateLimiter::new(&config.limiter);

    Ok(Arc::new(AppState {
        config,
        store,
        mailer,
        limiter,
    }))
}

async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.ip().to_string());

    if !state.limiter.allow(&key).await {
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let public_routes = Router::new()
        .route("/v1/healthcheck", get(system::healthcheck))
        .route("/v1/users", post(users::register_user))
        .route("/v1/users/activated", put(users::activate_user))
        .route(
            "/v1/tokens/authentication",
            post(tokens::create_authentication_token),
        );

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // Layer order (outermost first at runtime): trace, cors, panic guard,
    // rate limit, identity resolution, then the per-route gates.
    Router::new()
        .merge(public_routes)
        .merge(create_protected_router(&state))
        .layer(middleware::from_fn_with_state(state.clone(), auth::identify))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(CatchPanicLayer::new())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Every route below requires an authenticated, activated account plus
/// one specific permission code. The code guard sits on the method
/// router so that reads and writes on the same path can demand
/// different codes.
fn create_protected_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let permit = |code: &'static str| {
        middleware::from_fn_with_state((state.clone(), code), auth::require_permission)
    };

    Router::new()
        .route(
            "/v1/officers",
            get(officers::list_officers).route_layer(permit("officers:read")),
        )
        .route(
            "/v1/officers",
            post(officers::create_officer).route_layer(permit("officers:write")),
        )
        .route(
            "/v1/officers/{id}",
            get(officers::get_officer).route_layer(permit("officers:read")),
        )
        .route(
            "/v1/officers/{id}",
            patch(officers::update_officer)
                .delete(officers::delete_officer)
                .route_layer(permit("officers:write")),
        )
        .route(
            "/v1/courses",
            get(courses::list_courses).route_layer(permit("courses:read")),
        )
        .route(
            "/v1/courses",
            post(courses::create_course).route_layer(permit("courses:write")),
        )
        .route(
            "/v1/courses/{id}",
            get(courses::get_course).route_layer(permit("courses:read")),
        )
        .route(
            "/v1/courses/{id}",
            patch(courses::update_course)
                .delete(courses::delete_course)
                .route_layer(permit("courses:write")),
        )
        .route(
            "/v1/courses/{id}/feedback",
            get(feedback::list_course_feedback).route_layer(permit("feedback:read")),
        )
        .route(
            "/v1/courses/{id}/feedback",
            post(feedback::create_course_feedback).route_layer(permit("feedback:write")),
        )
        .route(
            "/v1/sessions",
            get(sessions::list_sessions).route_layer(permit("nits:read")),
        )
        .route(
            "/v1/sessions",
            post(sessions::create_session).route_layer(permit("nits:write")),
        )
        .route(
            "/v1/sessions/{id}",
            get(sessions::get_session).route_layer(permit("nits:read")),
        )
        .route(
            "/v1/sessions/{id}",
            patch(sessions::update_session)
                .delete(sessions::delete_session)
                .route_layer(permit("nits:write")),
        )
        .route(
            "/v1/sessions/{id}/enrollments",
            get(sessions::list_enrollments).route_layer(permit("nits:read")),
        )
        .route(
            "/v1/sessions/{id}/enrollments",
            post(sessions::create_enrollment).route_layer(permit("nits:write")),
        )
        .route(
            "/v1/sessions/{id}/facilitators",
            get(facilitators::list_session_facilitators).route_layer(permit("nits:read")),
        )
        .route(
            "/v1/sessions/{id}/facilitators",
            post(facilitators::assign_facilitator).route_layer(permit("nits:write")),
        )
        .route(
            "/v1/sessions/{id}/facilitators/{facilitator_id}",
            delete(facilitators::remove_facilitator).route_layer(permit("nits:write")),
        )
        .route(
            "/v1/facilitators",
            get(facilitators::list_facilitators).route_layer(permit("facilitators:read")),
        )
        .route(
            "/v1/facilitators",
            post(facilitators::create_facilitator).route_layer(permit("facilitators:write")),
        )
        .route(
            "/v1/facilitators/{id}",
            get(facilitators::get_facilitator).route_layer(permit("facilitators:read")),
        )
        .route(
            "/v1/facilitators/{id}",
            patch(facilitators::update_facilitator)
                .delete(facilitators::delete_facilitator)
                .route_layer(permit("facilitators:write")),
        )
        .route(
            "/v1/facilitators/{id}/feedback",
            get(feedback::list_facilitator_feedback).route_layer(permit("feedback:read")),
        )
        .route(
            "/v1/facilitators/{id}/feedback",
            post(feedback::create_facilitator_feedback).route_layer(permit("feedback:write")),
        )
        .route(
            "/v1/enrollments/{id}/course-rating",
            post(feedback::create_enrollment_course_rating).route_layer(permit("feedback:write")),
        )
        .route(
            "/v1/enrollments/{id}/facilitator-rating",
            post(feedback::create_enrollment_facilitator_rating)
                .route_layer(permit("feedback:write")),
        )
        .route(
            "/v1/users/{id}/permissions",
            post(users::grant_permission).route_layer(permit("permissions:write")),
        )
        .route_layer(middleware::from_fn(auth::require_activated))
        .route_layer(middleware::from_fn(auth::require_authenticated))
}
