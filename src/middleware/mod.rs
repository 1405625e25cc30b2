// src/middleware/mod.rs

pub mod admin_auth;
pub mod csrf;
pub mod rate_limit;
pub mod request_size_limit;

pub use admin_auth::admin_auth_middleware;
pub use rate_limit::{login_rate_limit_middleware, LoginThrottle};
pub use request_size_limit::request_size_limit_middleware;
