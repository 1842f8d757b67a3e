//! Multi-domain undo/redo engine.
//!
//! Reversible user actions ([`Changeset`]s) are pushed onto per-key bounded
//! undo stacks by a [`HistoryService`]. Each [`HistoryKey`] is an independent
//! domain with its own stacks and its own serialization lane, so:
//!
//! * operations on one key run one at a time, in call order,
//! * operations on different keys never wait for each other,
//! * every changeset is released exactly once, when eviction, a redo-clearing
//!   push, or [`HistoryService::clear`] removes it for good.
//!
//! ```no_run
//! # async fn demo() -> Result<(), atlas_history::HistoryError> {
//! use atlas_history::{HistoryKey, HistoryService, LayerHandle, LayerProperties};
//!
//! let history = HistoryService::default();
//! let layer = LayerHandle::new(LayerProperties { name: "roads".into(), opacity: 1.0, attribution: None });
//!
//! history.push(HistoryKey::MapEditing, layer.edit(|p| p.opacity = 0.4)).await?;
//! assert!(history.can_undo(HistoryKey::MapEditing));
//! history.undo(HistoryKey::MapEditing).await?;
//! assert_eq!(layer.get().opacity, 1.0);
//! # Ok(())
//! # }
//! ```

pub mod changeset;
pub mod config;
pub mod error;
mod id;
mod key;
mod lane;
pub mod outcome;
mod service;
mod store;
#[cfg(test)]
mod test_support;

pub use changeset::{
	Changeset, ChangesetGroup, LayerHandle, LayerProperties, LayerPropertiesChangeset, RevertHook, SnapshotChangeset, SnapshotTarget,
};
pub use config::HistoryConfig;
pub use error::{ConfigError, HistoryError};
pub use id::ChangesetId;
pub use key::HistoryKey;
pub use outcome::{HistorySnapshot, Pushed, ReleaseFailure, Released, StackDepths, Step};
pub use service::{HistoryService, Pending};
