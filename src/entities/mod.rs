pub mod prelude;

pub mod course_ratings;
pub mod courses;
pub mod facilitator_ratings;
pub mod facilitators;
pub mod permissions;
pub mod personnel;
pub mod session_enrollment;
pub mod session_facilitators;
pub mod tokens;
pub mod training_sessions;
pub mod user_permissions;
pub mod users;
