/// Upload coordination
///
/// Bridges an inbound upload (byte stream plus client-declared filename)
/// into the backend's storage-name space. The declared filename contributes
/// nothing but its extension; the base name is a fresh v4 UUID per upload,
/// so two uploads never collide and concurrent stores need no locking.

use std::{io::Cursor, sync::Arc};

use tokio::io::AsyncReadExt;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::storage::{AssetStorage, ByteStream};
use stowage_core::{Error, Result};

/// Probe buffer for the first read of an inbound stream.
const PROBE_LEN: usize = 8192;

/// Coordinates uploads and deletions against an [`AssetStorage`] backend
///
/// Callers owning a record with an asset slot sequence
/// delete-old / store-new / persist-reference themselves; the coordinator
/// provides no transactional atomicity across those steps.
pub struct UploadCoordinator {
	storage: Arc<dyn AssetStorage>,
}

impl UploadCoordinator {
	pub fn new(storage: Arc<dyn AssetStorage>) -> Self { Self { storage } }

	/// Store an inbound stream and return its public reference.
	///
	/// The stream is probed first: one that is empty or unreadable is
	/// rejected with [`Error::Upload`] before any backend I/O happens.
	pub async fn store(&self, stream: &mut ByteStream<'_>, declared_name: &str) -> Result<String> {
		let mut probe = [0_u8; PROBE_LEN];
		let probed = stream
			.read(&mut probe)
			.await
			.map_err(|e| Error::Upload(format!("unreadable upload stream: {e}")))?;

		if probed == 0 {
			return Err(Error::Upload("empty upload stream".to_owned()));
		}

		let name = storage_name(declared_name);
		trace!(?declared_name, ?name, "Storing upload");

		let mut joined = Cursor::new(&probe[..probed]).chain(stream);
		let written = self.storage.write(&name, &mut joined).await?;

		let reference = self.storage.resolve(&name);
		debug!(%reference, written, "Stored upload");
		Ok(reference)
	}

	/// Delete the asset a stored reference points at.
	///
	/// Empty and malformed references are treated as already deleted so
	/// that deleting an owning record never fails over a cosmetic
	/// reference mismatch; malformed ones are logged.
	pub async fn delete_by_reference(&self, reference: &str) -> Result {
		if reference.is_empty() {
			return Ok(());
		}

		let Some(name) = self.storage.parse(reference) else {
			debug!(?reference, "Ignoring malformed asset reference, treating as already deleted");
			return Ok(());
		};

		self.storage.remove(name).await
	}
}

/// Derive a fresh storage name, keeping only the declared filename's
/// extension.
fn storage_name(declared_name: &str) -> String {
	let id = Uuid::new_v4();
	match extension(declared_name) {
		| Some(ext) => format!("{id}.{ext}"),
		| None => id.to_string(),
	}
}

/// Extract the extension: the text after the final `.`, case preserved,
/// absent when there is no `.`. Sanitized before use since the declared
/// name is client input, never a trusted path component.
fn extension(declared_name: &str) -> Option<String> {
	let (_, ext) = declared_name.rsplit_once('.')?;
	let ext = sanitize_filename::sanitize(ext);
	(!ext.is_empty()).then_some(ext)
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use crate::storage::filesystem::FilesystemStorage;

	use super::*;

	fn coordinator(dir: &Path) -> UploadCoordinator {
		let storage = FilesystemStorage::new(dir.to_path_buf(), "user-content").unwrap();
		UploadCoordinator::new(Arc::new(storage))
	}

	/// Storage name from a reference, with the `.<ext>` tail split off.
	fn parts(reference: &str) -> (&str, Option<&str>) {
		let name = reference.strip_prefix("/user-content/").unwrap();
		match name.rsplit_once('.') {
			| Some((base, ext)) => (base, Some(ext)),
			| None => (name, None),
		}
	}

	#[test]
	fn extension_extraction() {
		assert_eq!(extension("photo.PNG").as_deref(), Some("PNG"));
		assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
		assert_eq!(extension(".gitignore").as_deref(), Some("gitignore"));
		assert_eq!(extension("README"), None);
		assert_eq!(extension("trailing."), None);
		assert_eq!(extension("weird.e/xt").as_deref(), Some("ext"));
	}

	#[tokio::test]
	async fn scenario_store_read_delete() {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();

		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let reference = coordinator
			.store(&mut Cursor::new(b"ABCD".as_slice()), "cat.jpg")
			.await
			.unwrap();

		let (base, ext) = parts(&reference);
		assert_eq!(ext, Some("jpg"));
		Uuid::parse_str(base).expect("base name is a canonical uuid");

		let on_disk = tokio::fs::read(temp_dir.path().join(format!("{base}.jpg")))
			.await
			.unwrap();
		assert_eq!(on_disk, b"ABCD");

		coordinator.delete_by_reference(&reference).await.unwrap();
		assert!(!temp_dir.path().join(format!("{base}.jpg")).exists());

		// Idempotent: deleting again is a no-op, not an error
		coordinator.delete_by_reference(&reference).await.unwrap();
	}

	#[tokio::test]
	async fn same_upload_twice_yields_distinct_assets() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let first = coordinator
			.store(&mut Cursor::new(b"same bytes".as_slice()), "dup.bin")
			.await
			.unwrap();
		let second = coordinator
			.store(&mut Cursor::new(b"same bytes".as_slice()), "dup.bin")
			.await
			.unwrap();

		assert_ne!(first, second);

		let mut files = Vec::new();
		let mut entries = tokio::fs::read_dir(temp_dir.path()).await.unwrap();
		while let Some(entry) = entries.next_entry().await.unwrap() {
			files.push(entry.file_name());
		}
		assert_eq!(files.len(), 2);
	}

	#[tokio::test]
	async fn extension_case_preserved() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let reference = coordinator
			.store(&mut Cursor::new(b"png bytes".as_slice()), "photo.PNG")
			.await
			.unwrap();
		assert!(reference.ends_with(".PNG"), "got {reference}");
	}

	#[tokio::test]
	async fn no_extension_is_not_an_error() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let reference = coordinator
			.store(&mut Cursor::new(b"text".as_slice()), "README")
			.await
			.unwrap();

		let (base, ext) = parts(&reference);
		assert_eq!(ext, None);
		Uuid::parse_str(base).unwrap();
	}

	#[tokio::test]
	async fn empty_stream_rejected_before_backend_io() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let err = coordinator
			.store(&mut Cursor::new(b"".as_slice()), "empty.txt")
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Upload(_)));

		let mut entries = tokio::fs::read_dir(temp_dir.path()).await.unwrap();
		assert!(entries.next_entry().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn payload_larger_than_probe_survives_intact() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let payload: Vec<u8> = (0..(PROBE_LEN * 3 + 17)).map(|i| (i % 251) as u8).collect();
		let reference = coordinator
			.store(&mut Cursor::new(payload.clone()), "big.bin")
			.await
			.unwrap();

		let (base, _) = parts(&reference);
		let on_disk = tokio::fs::read(temp_dir.path().join(format!("{base}.bin")))
			.await
			.unwrap();
		assert_eq!(on_disk, payload);
	}

	#[tokio::test]
	async fn malformed_and_empty_references_tolerated() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		coordinator.delete_by_reference("").await.unwrap();
		coordinator
			.delete_by_reference("/some-other-folder/x.png")
			.await
			.unwrap();
		coordinator
			.delete_by_reference("not a reference at all")
			.await
			.unwrap();
		coordinator
			.delete_by_reference("/user-content/../escape.png")
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn replace_sequence_leaves_single_asset() {
		let temp_dir = tempfile::tempdir().unwrap();
		let coordinator = coordinator(temp_dir.path());

		let old = coordinator
			.store(&mut Cursor::new(b"v1".as_slice()), "pic.jpg")
			.await
			.unwrap();

		// delete-old, write-new, persist-reference
		coordinator.delete_by_reference(&old).await.unwrap();
		let new = coordinator
			.store(&mut Cursor::new(b"v2".as_slice()), "pic.jpg")
			.await
			.unwrap();
		assert_ne!(old, new);

		let mut files = Vec::new();
		let mut entries = tokio::fs::read_dir(temp_dir.path()).await.unwrap();
		while let Some(entry) = entries.next_entry().await.unwrap() {
			files.push(entry.file_name());
		}
		assert_eq!(files.len(), 1);
	}
}
