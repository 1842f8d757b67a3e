//! The actor that owns one key's [`HistoryStore`].
//!
//! All stack mutation for a key happens inside [`HistoryLane::handle`], one
//! command at a time, in the order the commands were enqueued. After each
//! command settles the lane publishes a fresh [`HistorySnapshot`].

use std::num::NonZeroUsize;

use async_trait::async_trait;
use atlas_worker::{ActorFlow, WorkerActor};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::changeset::Changeset;
use crate::error::HistoryError;
use crate::outcome::{HistorySnapshot, Pushed, Released, Step};
use crate::store::HistoryStore;
use crate::{ChangesetId, HistoryKey};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, HistoryError>>;

pub(crate) enum LaneCommand {
	Push {
		id: ChangesetId,
		changeset: Box<dyn Changeset>,
		reply: Reply<Pushed>,
	},
	Undo {
		reply: Reply<Step>,
	},
	Redo {
		reply: Reply<Step>,
	},
	Clear {
		reply: Reply<Released>,
	},
}

pub(crate) struct HistoryLane {
	key: HistoryKey,
	store: HistoryStore,
	state: watch::Sender<HistorySnapshot>,
}

impl HistoryLane {
	pub fn new(key: HistoryKey, max_depth: NonZeroUsize) -> (Self, watch::Receiver<HistorySnapshot>) {
		let (state, rx) = watch::channel(HistorySnapshot::default());
		let lane = Self {
			key,
			store: HistoryStore::new(key, max_depth),
			state,
		};
		(lane, rx)
	}

	async fn push(&mut self, id: ChangesetId, mut changeset: Box<dyn Changeset>) -> Result<Pushed, HistoryError> {
		let label = changeset.label();
		if let Err(source) = changeset.apply().await {
			warn!(key = %self.key, %id, label, error = %source, "history.apply.failed");
			// Never stored, but it may hold resources captured at construction.
			let release = changeset.release().await.err();
			if let Some(error) = &release {
				warn!(key = %self.key, %id, label, error = %error, "history.release.failed");
			}
			return Err(HistoryError::Apply {
				key: self.key,
				id,
				label,
				source,
				release,
			});
		}
		let released = self.store.push(id, changeset).await;
		Ok(Pushed { id, released })
	}

	fn publish(&self) {
		let snapshot = self.store.snapshot();
		self.state.send_if_modified(|current| {
			if *current == snapshot {
				return false;
			}
			*current = snapshot;
			true
		});
	}
}

fn settle<T>(reply: Reply<T>, result: Result<T, HistoryError>) {
	// The caller may have dropped its future; the operation still counts.
	let _ = reply.send(result);
}

#[async_trait]
impl WorkerActor for HistoryLane {
	type Cmd = LaneCommand;

	async fn handle(&mut self, cmd: LaneCommand) -> ActorFlow {
		match cmd {
			LaneCommand::Push { id, changeset, reply } => {
				let result = self.push(id, changeset).await;
				self.publish();
				settle(reply, result);
			}
			LaneCommand::Undo { reply } => {
				let result = self.store.undo().await;
				self.publish();
				settle(reply, result);
			}
			LaneCommand::Redo { reply } => {
				let result = self.store.redo().await;
				self.publish();
				settle(reply, result);
			}
			LaneCommand::Clear { reply } => {
				let released = self.store.clear().await;
				self.publish();
				settle(reply, Ok(released));
			}
		}
		ActorFlow::Continue
	}

	async fn on_stop(&mut self) {
		let released = self.store.clear().await;
		self.publish();
		debug!(key = %self.key, released = released.ids.len(), failures = released.failures.len(), "history.lane.stopped");
	}
}
