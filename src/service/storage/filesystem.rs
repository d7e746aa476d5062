/// Filesystem storage backend
///
/// Stores each asset as one file in a single flat directory; the filename is
/// the storage name and the only metadata. References are root-relative
/// paths under the configured public segment.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io};
use tracing::{debug, trace, warn};

use super::{AssetStorage, ByteStream};
use stowage_core::{Error, Result, StorageConfig};

/// Filesystem-based asset storage
pub struct FilesystemStorage {
	dir: PathBuf,
	public_segment: String,
}

impl FilesystemStorage {
	/// Create a new filesystem storage backend
	///
	/// # Arguments
	/// * `dir` - Directory the files are stored in; created on first write
	/// * `public_segment` - Fixed public folder segment used in references
	pub fn new(dir: PathBuf, public_segment: impl Into<String>) -> Result<Self> {
		let public_segment = public_segment.into();
		if public_segment.is_empty() || public_segment.contains('/') {
			return Err(Error::Config(format!(
				"public segment {public_segment:?} must be a single non-empty path segment"
			)));
		}

		Ok(Self { dir, public_segment })
	}

	/// Create a backend from a [`StorageConfig`], storing files under
	/// `{root}/{public_segment}`.
	pub fn from_config(config: &StorageConfig) -> Result<Self> {
		Self::new(config.storage_dir(), config.public_segment.clone())
	}

	/// Get the full path for a given storage name
	fn get_path(&self, name: &str) -> PathBuf { self.dir.join(name) }

	/// Directory the files are stored in.
	#[must_use]
	pub fn dir(&self) -> &Path { &self.dir }

	/// Remove a partially written file after a failed transfer. Absence is
	/// fine; anything else is logged and swallowed since the write error
	/// is already on its way to the caller.
	async fn discard_partial(&self, path: &Path) {
		match fs::remove_file(path).await {
			| Ok(()) => debug!(?path, "Discarded partial file"),
			| Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
			| Err(e) => warn!(?path, "Failed to discard partial file: {e}"),
		}
	}
}

/// Reject storage names that could resolve outside the storage directory.
/// Separators and parent components are never produced by the upload
/// coordinator, so anything containing them is not ours.
fn validate_name(name: &str) -> Result<&str> {
	if name.is_empty()
		|| name == "."
		|| name == ".."
		|| name.contains('/')
		|| name.contains('\\')
	{
		return Err(Error::InvalidName(name.to_owned()));
	}

	Ok(name)
}

#[async_trait]
impl AssetStorage for FilesystemStorage {
	fn resolve(&self, name: &str) -> String { format!("/{}/{name}", self.public_segment) }

	fn parse<'a>(&self, reference: &'a str) -> Option<&'a str> {
		let name = reference
			.strip_prefix('/')?
			.strip_prefix(self.public_segment.as_str())?
			.strip_prefix('/')?;

		validate_name(name).ok()
	}

	async fn write(&self, name: &str, stream: &mut ByteStream<'_>) -> Result<u64> {
		let path = self.get_path(validate_name(name)?);

		fs::create_dir_all(&self.dir).await?;

		trace!(?name, ?path, "Creating file");
		let mut file = fs::File::create(&path).await?;

		let written = match io::copy(stream, &mut file).await {
			| Ok(written) => written,
			| Err(e) => {
				drop(file);
				self.discard_partial(&path).await;
				return Err(e.into());
			},
		};

		if let Err(e) = file.sync_all().await {
			drop(file);
			self.discard_partial(&path).await;
			return Err(e.into());
		}

		debug!(?name, written, "Stored file");
		Ok(written)
	}

	async fn remove(&self, name: &str) -> Result {
		let path = self.get_path(validate_name(name)?);

		match fs::remove_file(&path).await {
			| Ok(()) => {
				debug!(?name, "Removed file");
				Ok(())
			},
			| Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()), // Already deleted
			| Err(e) => Err(e.into()),
		}
	}

	async fn read(&self, name: &str) -> Result<Option<Bytes>> {
		let path = self.get_path(validate_name(name)?);

		match fs::read(&path).await {
			| Ok(data) => Ok(Some(Bytes::from(data))),
			| Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			| Err(e) => Err(e.into()),
		}
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		let path = self.get_path(validate_name(name)?);
		Ok(fs::try_exists(&path).await?)
	}
}
