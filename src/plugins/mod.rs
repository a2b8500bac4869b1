pub mod auth;
pub mod blogs;
pub mod health;
pub mod metrics;
pub mod samples;
pub mod shared;
