/// Storage configuration
///
/// An explicit root directory and public folder segment injected at
/// construction; the core never consults the environment implicitly.
/// `load` layers an optional TOML file and `STOWAGE_*` environment
/// variables over the defaults.

use std::path::{Path, PathBuf};

use figment::{
	providers::{Env, Format, Serialized, Toml},
	Figment,
};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Environment variable prefix recognized by `StorageConfig::load`.
pub const ENV_PREFIX: &str = "STOWAGE_";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Directory under which the public folder lives. Created on first
	/// write if absent.
	///
	/// default: "data"
	#[serde(default = "default_root")]
	pub root: PathBuf,

	/// Fixed public folder segment; stored files live in
	/// `{root}/{public_segment}` and references take the shape
	/// `/{public_segment}/{storage_name}`.
	///
	/// default: "user-content"
	#[serde(default = "default_public_segment")]
	pub public_segment: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			root: default_root(),
			public_segment: default_public_segment(),
		}
	}
}

impl StorageConfig {
	/// Load configuration from defaults, an optional TOML file, and
	/// `STOWAGE_*` environment variables, in increasing precedence.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let mut figment = Figment::from(Serialized::defaults(Self::default()));

		if let Some(path) = path {
			figment = figment.merge(Toml::file(path));
		}

		Ok(figment.merge(Env::prefixed(ENV_PREFIX)).extract()?)
	}

	/// Directory holding the stored files.
	#[must_use]
	pub fn storage_dir(&self) -> PathBuf { self.root.join(&self.public_segment) }
}

fn default_root() -> PathBuf { PathBuf::from("data") }

fn default_public_segment() -> String { String::from("user-content") }
