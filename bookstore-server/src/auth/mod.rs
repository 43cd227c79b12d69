//! Authentication middleware for the order API

pub mod user_auth;

pub use user_auth::{UserIdentity, create_token, user_auth_middleware};
