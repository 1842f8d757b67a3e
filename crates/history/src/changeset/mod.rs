//! The reversible-unit contract and the shared variants built on it.
//!
//! A [`Changeset`] moves through `applied -> reverted -> reapplied ...` any
//! number of times while it sits on a stack, and is released exactly once
//! when it leaves both stacks for good. [`Changeset::release`] consumes the
//! box, so nothing can touch a changeset after its release.

use async_trait::async_trait;

mod callback;
mod group;
mod layer;
mod snapshot;

pub use callback::RevertHook;
pub use group::ChangesetGroup;
pub use layer::{LayerHandle, LayerProperties, LayerPropertiesChangeset};
pub use snapshot::{SnapshotChangeset, SnapshotTarget};

/// One user-visible reversible action.
///
/// The engine never calls two of these methods concurrently on the same
/// instance, and never calls `revert` unless the changeset is the most
/// recently applied entry for its key.
#[async_trait]
pub trait Changeset: Send + 'static {
	/// Performs the forward action.
	async fn apply(&mut self) -> anyhow::Result<()>;

	/// Performs the exact inverse of [`Changeset::apply`].
	async fn revert(&mut self) -> anyhow::Result<()>;

	/// Frees anything the changeset captured (temporary handles, object
	/// URLs, timers). Called once, after the changeset left both stacks.
	async fn release(self: Box<Self>) -> anyhow::Result<()> {
		Ok(())
	}

	/// Short name used in logs and errors.
	fn label(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}
