pub mod storage;
pub mod upload;

use std::sync::Arc;

pub use storage::{filesystem::FilesystemStorage, AssetStorage};
pub use stowage_core::{Error, Result, StorageConfig};
pub use upload::UploadCoordinator;

/// Build an [`UploadCoordinator`] over the configured backend.
///
/// Only the filesystem backend exists today; a future object-store backend
/// would slot in behind the same [`AssetStorage`] trait without changing
/// callers.
pub fn from_config(config: &StorageConfig) -> Result<UploadCoordinator> {
	let storage = Arc::new(FilesystemStorage::from_config(config)?);
	Ok(UploadCoordinator::new(storage))
}
