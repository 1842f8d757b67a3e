//! Public entry point: per-key serialized push / undo / redo / clear.
//!
//! Every mutating call is enqueued on its key's lane *synchronously*, before
//! the returned future is first polled, so a key observes operations in the
//! order they were called. Each lane runs one operation at a time and only
//! starts the next once the previous one has settled, success or failure.
//! Lanes for different keys run independently.
//!
//! Stack queries read the snapshot the lane published after its last
//! settled operation; they never wait and never create a lane.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use atlas_worker::{ActorHandle, MailboxClosed, TaskClass, spawn_actor};
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use crate::HistoryKey;
use crate::changeset::Changeset;
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::id::IdClock;
use crate::lane::{HistoryLane, LaneCommand, Reply};
use crate::outcome::{HistorySnapshot, Pushed, Released, StackDepths, Step};

struct Lane {
	handle: ActorHandle<LaneCommand>,
	state: watch::Receiver<HistorySnapshot>,
}

impl Lane {
	fn spawn(key: HistoryKey, config: &HistoryConfig) -> Self {
		let max_depth = config.depth_for(key);
		let (lane, state) = HistoryLane::new(key, max_depth);
		debug!(%key, max_depth = max_depth.get(), "history.lane.start");
		Self {
			handle: spawn_actor(format!("history:{key}"), TaskClass::Interactive, lane),
			state,
		}
	}
}

/// Undo/redo engine for every [`HistoryKey`].
///
/// Share it by reference or `Arc`; all methods take `&self`. Lanes are
/// created on first use. Dropping the service closes every lane, which then
/// releases whatever it still holds in the background; call
/// [`HistoryService::shutdown`] to wait for that instead.
pub struct HistoryService {
	config: HistoryConfig,
	ids: IdClock,
	lanes: Mutex<HashMap<HistoryKey, Lane>>,
}

impl Default for HistoryService {
	fn default() -> Self {
		Self::new(HistoryConfig::default())
	}
}

impl HistoryService {
	pub fn new(config: HistoryConfig) -> Self {
		Self {
			config,
			ids: IdClock::default(),
			lanes: Mutex::new(HashMap::new()),
		}
	}

	pub fn config(&self) -> &HistoryConfig {
		&self.config
	}

	/// Applies `changeset` and, if that succeeds, stores it on top of the undo
	/// stack, releasing any evicted or abandoned redo entries.
	///
	/// When apply fails the stacks are left exactly as they were and the
	/// changeset is released without ever being stored.
	pub fn push(&self, key: HistoryKey, changeset: impl Changeset) -> Pending<Pushed> {
		self.push_boxed(key, Box::new(changeset))
	}

	pub fn push_boxed(&self, key: HistoryKey, changeset: Box<dyn Changeset>) -> Pending<Pushed> {
		let id = self.ids.next();
		self.dispatch(key, |reply| LaneCommand::Push { id, changeset, reply })
	}

	/// Reverts the most recent changeset. Resolves to [`Step::Empty`] when
	/// there is nothing to undo.
	pub fn undo(&self, key: HistoryKey) -> Pending<Step> {
		self.dispatch(key, |reply| LaneCommand::Undo { reply })
	}

	/// Reapplies the most recently undone changeset. Resolves to
	/// [`Step::Empty`] when there is nothing to redo.
	pub fn redo(&self, key: HistoryKey) -> Pending<Step> {
		self.dispatch(key, |reply| LaneCommand::Redo { reply })
	}

	/// Releases every changeset on both stacks of `key`.
	pub fn clear(&self, key: HistoryKey) -> Pending<Released> {
		self.dispatch(key, |reply| LaneCommand::Clear { reply })
	}

	/// Clears every key that has a lane. All clears are enqueued before the
	/// returned future is polled.
	pub fn clear_all(&self) -> impl Future<Output = Vec<(HistoryKey, Result<Released, HistoryError>)>> + Send + use<> {
		let keys: Vec<HistoryKey> = {
			let lanes = self.lanes.lock();
			let mut keys: Vec<_> = lanes.keys().copied().collect();
			keys.sort();
			keys
		};
		let pending: Vec<_> = keys.into_iter().map(|key| (key, self.clear(key))).collect();
		async move {
			let mut results = Vec::with_capacity(pending.len());
			for (key, op) in pending {
				results.push((key, op.await));
			}
			results
		}
	}

	pub fn can_undo(&self, key: HistoryKey) -> bool {
		self.read(key, HistorySnapshot::can_undo)
	}

	pub fn can_redo(&self, key: HistoryKey) -> bool {
		self.read(key, HistorySnapshot::can_redo)
	}

	pub fn stack_depths(&self, key: HistoryKey) -> StackDepths {
		self.read(key, HistorySnapshot::depths)
	}

	/// Changeset ids on both stacks as of the last settled operation.
	pub fn snapshot(&self, key: HistoryKey) -> HistorySnapshot {
		self.read(key, HistorySnapshot::clone)
	}

	/// Watches the published snapshot of `key`, starting its lane if needed.
	pub fn subscribe(&self, key: HistoryKey) -> watch::Receiver<HistorySnapshot> {
		let mut lanes = self.lanes.lock();
		self.lane(&mut lanes, key).state.clone()
	}

	/// Operations queued on `key` that have not started yet.
	pub fn pending(&self, key: HistoryKey) -> usize {
		self.lanes.lock().get(&key).map_or(0, |lane| lane.handle.pending())
	}

	/// Closes every lane and waits until each has drained its queue and
	/// released everything it held. A later call on any key starts a fresh,
	/// empty lane.
	pub fn shutdown(&self) -> impl Future<Output = ()> + Send + use<> {
		let lanes: Vec<(HistoryKey, Lane)> = self.lanes.lock().drain().collect();
		for (_, lane) in &lanes {
			lane.handle.close();
		}
		async move {
			for (key, lane) in lanes {
				let exit = lane.handle.shutdown().await;
				debug!(%key, exit = ?exit.as_ref().map(|e| e.kind()), "history.lane.shutdown");
			}
		}
	}

	fn read<T>(&self, key: HistoryKey, f: impl FnOnce(&HistorySnapshot) -> T) -> T {
		match self.lanes.lock().get(&key) {
			// A dead lane's last snapshot names changesets that no longer exist.
			Some(lane) if !lane.handle.is_closed() => f(&lane.state.borrow()),
			_ => f(&HistorySnapshot::default()),
		}
	}

	fn lane<'a>(&self, lanes: &'a mut HashMap<HistoryKey, Lane>, key: HistoryKey) -> &'a Lane {
		if let Some(dead) = lanes.get(&key).filter(|lane| lane.handle.is_closed()) {
			let exit = dead.handle.last_exit();
			warn!(
				%key,
				exit = ?exit.as_ref().map(|e| e.kind()),
				message = exit.as_ref().and_then(|e| e.message()).unwrap_or(""),
				"history.lane.restart"
			);
			lanes.remove(&key);
		}
		lanes.entry(key).or_insert_with(|| Lane::spawn(key, &self.config))
	}

	fn dispatch<T>(&self, key: HistoryKey, command: impl FnOnce(Reply<T>) -> LaneCommand) -> Pending<T> {
		let (reply, rx) = oneshot::channel();
		let mut lanes = self.lanes.lock();
		if let Err(MailboxClosed(command)) = self.lane(&mut lanes, key).handle.send(command(reply)) {
			// The lane died after the liveness check; its replacement takes the command.
			// A second rejection drops the reply sender, resolving `rx` to LaneClosed.
			let _ = self.lane(&mut lanes, key).handle.send(command);
		}
		Pending { key, rx }
	}
}

/// An operation already enqueued on its key's lane.
///
/// Awaiting yields the settled result. Dropping it does not cancel the
/// operation; it still runs in its turn.
#[must_use = "the operation is already queued; await it to observe the result"]
pub struct Pending<T> {
	key: HistoryKey,
	rx: oneshot::Receiver<Result<T, HistoryError>>,
}

impl<T> Pending<T> {
	pub fn key(&self) -> HistoryKey {
		self.key
	}
}

impl<T> Future for Pending<T> {
	type Output = Result<T, HistoryError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		let key = this.key;
		match Pin::new(&mut this.rx).poll(cx) {
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			Poll::Ready(Err(_)) => Poll::Ready(Err(HistoryError::LaneClosed { key })),
			Poll::Pending => Poll::Pending,
		}
	}
}
