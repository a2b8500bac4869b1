pub mod config;
pub mod db;
pub mod http_error;
pub mod kernel;
pub mod plugins;
pub mod services;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::db::*;
pub use crate::kernel::*;
