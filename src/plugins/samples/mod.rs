pub mod handlers;
pub mod models;
pub mod plugin;
pub mod repo;
pub mod service;

pub use plugin::SamplesPlugin;
pub use service::SampleService;
