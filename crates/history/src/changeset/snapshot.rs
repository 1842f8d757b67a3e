use async_trait::async_trait;

use super::Changeset;

/// Mutable state that can be captured and written back whole.
#[async_trait]
pub trait SnapshotTarget: Send + Sync + 'static {
	type Snapshot: Clone + Send + Sync + 'static;

	/// Reads the current state.
	fn capture(&self) -> Self::Snapshot;

	/// Overwrites the current state.
	async fn write(&self, snapshot: &Self::Snapshot) -> anyhow::Result<()>;

	/// Tells dependent views to redraw after a write.
	fn refresh(&self);
}

/// Changeset holding a before and an after snapshot of a target.
///
/// `apply` writes `after`, `revert` writes `before`; each is followed by a
/// refresh, even when the write fails part way. Holds no external resource,
/// so release is a no-op.
pub struct SnapshotChangeset<T: SnapshotTarget> {
	target: T,
	before: T::Snapshot,
	after: T::Snapshot,
	label: &'static str,
}

impl<T: SnapshotTarget> SnapshotChangeset<T> {
	pub fn new(target: T, before: T::Snapshot, after: T::Snapshot) -> Self {
		Self {
			target,
			before,
			after,
			label: "snapshot",
		}
	}

	/// Captures `before` from the target now and derives `after` from it.
	pub fn capture_then(target: T, edit: impl FnOnce(&mut T::Snapshot)) -> Self {
		let before = target.capture();
		let mut after = before.clone();
		edit(&mut after);
		Self::new(target, before, after)
	}

	#[must_use]
	pub fn labeled(mut self, label: &'static str) -> Self {
		self.label = label;
		self
	}

	pub fn before(&self) -> &T::Snapshot {
		&self.before
	}

	pub fn after(&self) -> &T::Snapshot {
		&self.after
	}

	async fn write_and_refresh(&self, snapshot: &T::Snapshot) -> anyhow::Result<()> {
		let written = self.target.write(snapshot).await;
		self.target.refresh();
		written
	}
}

#[async_trait]
impl<T: SnapshotTarget> Changeset for SnapshotChangeset<T> {
	async fn apply(&mut self) -> anyhow::Result<()> {
		self.write_and_refresh(&self.after).await
	}

	async fn revert(&mut self) -> anyhow::Result<()> {
		self.write_and_refresh(&self.before).await
	}

	fn label(&self) -> &'static str {
		self.label
	}
}
