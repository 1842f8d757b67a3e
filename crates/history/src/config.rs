//! History depth configuration.
//!
//! ```toml
//! max_depth = 50
//!
//! [keys.data_table]
//! max_depth = 20
//! ```

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::HistoryKey;
use crate::error::ConfigError;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Depth bound applied to any key without an override.
pub const DEFAULT_MAX_DEPTH: NonZeroUsize = NonZeroUsize::new(50).expect("non-zero literal");

/// Per-key stack depth bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
	max_depth: NonZeroUsize,
	overrides: HashMap<HistoryKey, NonZeroUsize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
	max_depth: Option<usize>,
	#[serde(default)]
	keys: HashMap<HistoryKey, RawKeyConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeyConfig {
	max_depth: usize,
}

impl Default for HistoryConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			overrides: HashMap::new(),
		}
	}
}

impl HistoryConfig {
	/// Uses `max_depth` for every key.
	pub fn uniform(max_depth: NonZeroUsize) -> Self {
		Self {
			max_depth,
			overrides: HashMap::new(),
		}
	}

	/// Overrides the depth bound of one key.
	#[must_use]
	pub fn with_depth(mut self, key: HistoryKey, max_depth: NonZeroUsize) -> Self {
		self.overrides.insert(key, max_depth);
		self
	}

	/// Depth bound for `key`.
	pub fn depth_for(&self, key: HistoryKey) -> NonZeroUsize {
		self.overrides.get(&key).copied().unwrap_or(self.max_depth)
	}

	/// Parses configuration from TOML text.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let raw: RawConfig = toml::from_str(input)?;
		let max_depth = match raw.max_depth {
			Some(depth) => non_zero(depth, "all keys")?,
			None => DEFAULT_MAX_DEPTH,
		};
		let mut overrides = HashMap::with_capacity(raw.keys.len());
		for (key, cfg) in raw.keys {
			overrides.insert(key, non_zero(cfg.max_depth, key.as_str())?);
		}
		Ok(Self { max_depth, overrides })
	}

	/// Reads and parses a TOML configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}
}

fn non_zero(depth: usize, scope: &str) -> Result<NonZeroUsize> {
	NonZeroUsize::new(depth).ok_or_else(|| ConfigError::ZeroDepth { scope: scope.to_string() })
}
