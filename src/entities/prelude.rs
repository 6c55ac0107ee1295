pub use super::course_ratings::Entity as CourseRatings;
pub use super::courses::Entity as Courses;
pub use super::facilitator_ratings::Entity as FacilitatorRatings;
pub use super::facilitators::Entity as Facilitators;
pub use super::permissions::Entity as Permissions;
pub use super::personnel::Entity as Personnel;
pub use super::session_enrollment::Entity as SessionEnrollment;
pub use super::session_facilitators::Entity as SessionFacilitators;
pub use super::tokens::Entity as Tokens;
pub use super::training_sessions::Entity as TrainingSessions;
pub use super::user_permissions::Entity as UserPermissions;
pub use super::users::Entity as Users;
