pub mod config;
pub mod error;

pub use config::StorageConfig;
pub use error::{Error, Result};
