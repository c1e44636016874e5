pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, get_admin_subject};
pub use cors::create_cors;
