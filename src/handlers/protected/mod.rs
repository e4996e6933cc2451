// Protected handlers: the JWT gate runs first and injects AuthUser, mounted under /prot
pub mod auth;
pub mod catalog;
pub mod employees;
pub mod requests;
pub mod settings;
pub mod users;
