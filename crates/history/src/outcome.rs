//! Settled results of history operations.

use crate::ChangesetId;

/// Result of a successful push.
#[derive(Debug)]
pub struct Pushed {
	pub id: ChangesetId,
	/// Changesets released by this push: the evicted oldest entry, then the
	/// abandoned redo entries.
	pub released: Released,
}

/// Result of an undo or redo that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	/// The changeset moved to the opposite stack.
	Moved(ChangesetId),
	/// Nothing to undo (or redo).
	Empty,
}

impl Step {
	pub fn moved(self) -> Option<ChangesetId> {
		match self {
			Self::Moved(id) => Some(id),
			Self::Empty => None,
		}
	}

	pub fn is_empty(self) -> bool {
		self == Self::Empty
	}
}

/// Changesets that left both stacks permanently.
#[derive(Debug, Default)]
pub struct Released {
	/// Every released changeset in release order, including failed ones.
	pub ids: Vec<ChangesetId>,
	pub failures: Vec<ReleaseFailure>,
}

impl Released {
	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}
}

/// A release that reported an error. The changeset is gone regardless.
#[derive(Debug)]
pub struct ReleaseFailure {
	pub id: ChangesetId,
	pub error: anyhow::Error,
}

/// Published view of one key's stacks, oldest entry first.
///
/// The last element of `undo` is the next to undo; the last element of
/// `redo` is the next to redo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
	pub undo: Vec<ChangesetId>,
	pub redo: Vec<ChangesetId>,
}

impl HistorySnapshot {
	pub fn can_undo(&self) -> bool {
		!self.undo.is_empty()
	}

	pub fn can_redo(&self) -> bool {
		!self.redo.is_empty()
	}

	pub fn depths(&self) -> StackDepths {
		StackDepths {
			undo: self.undo.len(),
			redo: self.redo.len(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackDepths {
	pub undo: usize,
	pub redo: usize,
}
