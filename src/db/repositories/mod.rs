pub mod course;
pub mod enrollment;
pub mod facilitator;
pub mod feedback;
pub mod officer;
pub mod permission;
pub mod session;
pub mod token;
pub mod user;
