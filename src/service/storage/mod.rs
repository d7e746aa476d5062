/// Storage abstraction for uploaded assets
///
/// This module provides a trait-based abstraction for asset storage so that
/// different backends can be used interchangeably. Exactly one backend is
/// implemented here: the local filesystem.

pub mod filesystem;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use stowage_core::Result;

/// Byte stream accepted by [`AssetStorage::write`].
pub type ByteStream<'a> = dyn AsyncRead + Send + Unpin + 'a;

/// Trait for asset storage backends
///
/// A backend owns one flat namespace of storage names and knows how to
/// translate a name into the externally addressable reference and back.
/// Callers never hand a backend anything but a storage name; the name is the
/// only metadata a stored asset has.
#[async_trait]
pub trait AssetStorage: Send + Sync {
	/// Translate a storage name into its public reference.
	///
	/// Pure string construction, no I/O and no failure mode. The result is
	/// safe to embed in rendered output or API payloads as a fetchable
	/// path.
	fn resolve(&self, name: &str) -> String;

	/// Recover the storage name from a public reference.
	///
	/// Inverse of [`resolve`](Self::resolve): for every valid storage name
	/// `parse(&resolve(name)) == Some(name)`. Returns `None` when the
	/// reference does not match this backend's reference shape.
	fn parse<'a>(&self, reference: &'a str) -> Option<&'a str>;

	/// Write the full contents of `stream` under `name`
	///
	/// Creates the backing directory if absent. Does not return before all
	/// bytes are durably flushed; a failure partway through removes the
	/// partial file before the error is reported.
	///
	/// # Returns
	/// * `Ok(len)` - number of bytes written
	/// * `Err` if the name is invalid or the write fails
	async fn write(&self, name: &str, stream: &mut ByteStream<'_>) -> Result<u64>;

	/// Delete the file stored under `name`
	///
	/// # Returns
	/// * `Ok(())` if deleted, or if no such file existed
	/// * `Err` if deletion fails for any other reason
	async fn remove(&self, name: &str) -> Result;

	/// Read the file stored under `name`
	///
	/// # Returns
	/// * `Ok(Some(bytes))` if the file exists
	/// * `Ok(None)` if not found
	/// * `Err` if the read fails
	async fn read(&self, name: &str) -> Result<Option<Bytes>>;

	/// Check whether a file is stored under `name`
	async fn exists(&self, name: &str) -> Result<bool>;
}
