//! Bounded undo/redo stacks for one history key.
//!
//! Stacks are strictly LIFO; entries are never reordered, merged, or
//! coalesced. Every entry that leaves both stacks for good is released on
//! the way out:
//!
//! * pushing past the depth bound evicts the oldest undo entry,
//! * pushing anything drops the whole redo stack,
//! * clearing drops both stacks.
//!
//! Release order always runs from the newest point of the timeline back
//! towards the oldest: redo entries furthest in the future first, then undo
//! entries from the top down.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use tracing::{debug, trace, warn};

use crate::changeset::Changeset;
use crate::error::HistoryError;
use crate::outcome::{HistorySnapshot, ReleaseFailure, Released, StackDepths, Step};
use crate::{ChangesetId, HistoryKey};

struct Entry {
	id: ChangesetId,
	changeset: Box<dyn Changeset>,
}

/// Undo and redo stacks of one key with a depth bound on undo.
///
/// Entries in `undo` are applied; entries in `redo` are reverted.
pub(crate) struct HistoryStore {
	key: HistoryKey,
	max_depth: NonZeroUsize,
	/// Oldest at the front, next to undo at the back.
	undo: VecDeque<Entry>,
	/// Next to redo at the back.
	redo: Vec<Entry>,
}

impl HistoryStore {
	pub fn new(key: HistoryKey, max_depth: NonZeroUsize) -> Self {
		Self {
			key,
			max_depth,
			undo: VecDeque::new(),
			redo: Vec::new(),
		}
	}

	pub fn depths(&self) -> StackDepths {
		StackDepths {
			undo: self.undo.len(),
			redo: self.redo.len(),
		}
	}

	pub fn snapshot(&self) -> HistorySnapshot {
		HistorySnapshot {
			undo: self.undo.iter().map(|e| e.id).collect(),
			redo: self.redo.iter().map(|e| e.id).collect(),
		}
	}

	/// Stores an already-applied changeset on top of the undo stack.
	///
	/// Evicts from the bottom while the stack is full, then releases and
	/// empties the redo stack.
	pub async fn push(&mut self, id: ChangesetId, changeset: Box<dyn Changeset>) -> Released {
		let mut released = Released::default();

		while self.undo.len() >= self.max_depth.get() {
			let Some(oldest) = self.undo.pop_front() else {
				break;
			};
			debug!(key = %self.key, id = %oldest.id, max_depth = self.max_depth.get(), "history.evict");
			release_into(self.key, oldest, &mut released).await;
		}

		trace!(key = %self.key, %id, label = changeset.label(), undo = self.undo.len() + 1, "history.push");
		self.undo.push_back(Entry { id, changeset });

		if !self.redo.is_empty() {
			trace!(key = %self.key, cleared = self.redo.len(), "history.redo_cleared");
		}
		let abandoned = std::mem::take(&mut self.redo);
		for entry in abandoned {
			release_into(self.key, entry, &mut released).await;
		}

		released
	}

	/// Reverts the top undo entry and moves it to redo.
	///
	/// The entry moves even when revert fails, so a bad entry cannot wedge
	/// the stacks; the failure is still returned.
	pub async fn undo(&mut self) -> Result<Step, HistoryError> {
		let Some(mut entry) = self.undo.pop_back() else {
			trace!(key = %self.key, "history.undo.empty");
			return Ok(Step::Empty);
		};
		let id = entry.id;
		let label = entry.changeset.label();
		let reverted = entry.changeset.revert().await;
		self.redo.push(entry);
		trace!(key = %self.key, %id, label, depths = ?self.depths(), "history.undo");

		match reverted {
			Ok(()) => Ok(Step::Moved(id)),
			Err(source) => {
				warn!(key = %self.key, %id, label, error = %source, "history.revert.failed");
				Err(HistoryError::Revert {
					key: self.key,
					id,
					label,
					source,
				})
			}
		}
	}

	/// Reapplies the top redo entry and moves it back to undo.
	///
	/// Like [`Self::undo`], the entry moves even when apply fails.
	pub async fn redo(&mut self) -> Result<Step, HistoryError> {
		let Some(mut entry) = self.redo.pop() else {
			trace!(key = %self.key, "history.redo.empty");
			return Ok(Step::Empty);
		};
		let id = entry.id;
		let label = entry.changeset.label();
		let reapplied = entry.changeset.apply().await;
		self.undo.push_back(entry);
		trace!(key = %self.key, %id, label, depths = ?self.depths(), "history.redo");

		match reapplied {
			Ok(()) => Ok(Step::Moved(id)),
			Err(source) => {
				warn!(key = %self.key, %id, label, error = %source, "history.reapply.failed");
				Err(HistoryError::Reapply {
					key: self.key,
					id,
					label,
					source,
				})
			}
		}
	}

	/// Releases every entry on both stacks and empties them.
	pub async fn clear(&mut self) -> Released {
		let mut released = Released::default();
		let redo = std::mem::take(&mut self.redo);
		let undo = std::mem::take(&mut self.undo);
		debug!(key = %self.key, undo = undo.len(), redo = redo.len(), "history.clear");

		for entry in redo {
			release_into(self.key, entry, &mut released).await;
		}
		for entry in undo.into_iter().rev() {
			release_into(self.key, entry, &mut released).await;
		}
		released
	}
}

async fn release_into(key: HistoryKey, entry: Entry, released: &mut Released) {
	let Entry { id, changeset } = entry;
	let label = changeset.label();
	released.ids.push(id);
	if let Err(error) = changeset.release().await {
		warn!(%key, %id, label, error = %error, "history.release.failed");
		released.failures.push(ReleaseFailure { id, error });
	}
}
