// Public handlers: no token required, mounted under /pub
pub mod catalog;
pub mod identity;

pub use catalog::create as catalog_create;
pub use identity::{employee_signin, employee_signup, user_signin, user_signup};
