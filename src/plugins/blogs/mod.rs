pub mod form;
pub mod handlers;
pub mod models;
pub mod plugin;
pub mod repo;
pub mod service;
pub mod slug;

pub use plugin::BlogsPlugin;
pub use service::BlogService;
