pub mod handlers;
pub mod middleware;
pub mod models;
pub mod plugin;
pub mod repo;
pub mod service;

pub use middleware::{require_auth, AuthUser};
pub use plugin::AuthPlugin;
pub use service::AuthService;
