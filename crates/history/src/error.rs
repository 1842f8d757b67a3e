//! Error types for history operations and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::{ChangesetId, HistoryKey};

/// Failure of a history operation.
///
/// `Apply` leaves the stacks untouched; the rejected changeset has already
/// been released, and `release` holds the error if that release failed.
/// `Revert` and `Reapply` are reported after the changeset has already moved
/// to the opposite stack.
#[derive(Debug, Error)]
pub enum HistoryError {
	#[error("{label} ({id}) failed to apply on {key}")]
	Apply {
		key: HistoryKey,
		id: ChangesetId,
		label: &'static str,
		#[source]
		source: anyhow::Error,
		release: Option<anyhow::Error>,
	},

	#[error("{label} ({id}) failed to revert on {key}")]
	Revert {
		key: HistoryKey,
		id: ChangesetId,
		label: &'static str,
		#[source]
		source: anyhow::Error,
	},

	#[error("{label} ({id}) failed to reapply on {key}")]
	Reapply {
		key: HistoryKey,
		id: ChangesetId,
		label: &'static str,
		#[source]
		source: anyhow::Error,
	},

	/// The lane serving this key exited before the operation settled.
	#[error("history lane for {key} closed before the operation settled")]
	LaneClosed { key: HistoryKey },
}

impl HistoryError {
	pub fn key(&self) -> HistoryKey {
		match self {
			Self::Apply { key, .. } | Self::Revert { key, .. } | Self::Reapply { key, .. } | Self::LaneClosed { key } => *key,
		}
	}

	/// Id of the changeset involved, if the failure came from one.
	pub fn changeset(&self) -> Option<ChangesetId> {
		match self {
			Self::Apply { id, .. } | Self::Revert { id, .. } | Self::Reapply { id, .. } => Some(*id),
			Self::LaneClosed { .. } => None,
		}
	}
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	/// A depth bound of zero would evict every changeset as it lands.
	#[error("max_depth for {scope} must be at least 1")]
	ZeroDepth { scope: String },
}
