pub mod mailer;
pub mod rate_limit;

pub use mailer::{LogMailer, Mailer};
pub use rate_limit::RateLimiter;
