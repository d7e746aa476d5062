/// Error types shared across the workspace
///
/// All failures are surfaced synchronously to the immediate caller; nothing
/// here is fatal to the host process and no retries happen internally.

use thiserror::Error;

/// Result type used throughout, defaulting to a unit success value.
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// Underlying storage unavailable, denied, or full. Writes that fail
	/// partway clean up after themselves before this is returned.
	#[error("I/O failure: {0}")]
	Io(#[from] std::io::Error),

	/// Malformed or empty inbound upload stream, rejected before any
	/// backend I/O is attempted.
	#[error("upload rejected: {0}")]
	Upload(String),

	/// Storage name that could escape the storage root.
	#[error("invalid storage name: {0:?}")]
	InvalidName(String),

	/// Bad or unloadable configuration.
	#[error("configuration error: {0}")]
	Config(String),
}

impl Error {
	/// Whether this error came from the underlying filesystem rather than
	/// from input validation.
	#[must_use]
	pub fn is_io(&self) -> bool { matches!(self, Self::Io(_)) }
}

impl From<figment::Error> for Error {
	fn from(e: figment::Error) -> Self { Self::Config(e.to_string()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn io_errors_convert() {
		let e: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
		assert!(e.is_io());
		assert!(e.to_string().contains("denied"));
	}

	#[test]
	fn upload_errors_are_not_io() {
		let e = Error::Upload("empty stream".into());
		assert!(!e.is_io());
	}
}
