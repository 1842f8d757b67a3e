//! Single-consumer actors driven by a FIFO [`Mailbox`].
//!
//! Each actor is one spawned task that owns its state and handles commands
//! strictly one at a time, in enqueue order. A supervising task awaits the
//! actor, records how it exited, and closes the mailbox so later sends fail
//! fast instead of queueing into a dead actor.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinError;

use crate::TaskClass;
use crate::mailbox::{Mailbox, MailboxClosed, MailboxReceiver, MailboxSender};

/// Continuation directive from one command handling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorFlow {
	/// Continue processing commands.
	Continue,
	/// Stop this actor.
	Stop,
}

/// Exit classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	Stopped,
	MailboxClosed,
	Panicked,
	JoinFailed,
}

/// Exit summary recorded by the supervising task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn is_failure(&self) -> bool {
		matches!(self.kind, ActorExitKind::Panicked | ActorExitKind::JoinFailed)
	}

	fn from_join_error(err: JoinError) -> Self {
		if err.is_panic() {
			Self {
				kind: ActorExitKind::Panicked,
				message: join_error_panic_message(err),
			}
		} else {
			Self {
				kind: ActorExitKind::JoinFailed,
				message: Some(err.to_string()),
			}
		}
	}
}

/// Extracts the panic payload text from a join error, if it was a panic.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return Some(msg.clone());
	}
	Some("non-string panic payload".to_string())
}

/// Actor executed by [`spawn_actor`].
#[async_trait]
pub trait WorkerActor: Send + 'static {
	type Cmd: Send + 'static;

	/// Handles one command. The next command is not received until this returns.
	async fn handle(&mut self, cmd: Self::Cmd) -> ActorFlow;

	/// Runs once after the last command, when the actor exits normally.
	async fn on_stop(&mut self) {}
}

/// Handle for one spawned actor.
///
/// Dropping the handle closes the mailbox; the actor then drains queued
/// commands, runs [`WorkerActor::on_stop`], and exits in the background.
pub struct ActorHandle<Cmd>
where
	Cmd: Send + 'static,
{
	name: Arc<str>,
	class: TaskClass,
	tx: MailboxSender<Cmd>,
	exit: watch::Receiver<Option<ActorExit>>,
}

impl<Cmd> Drop for ActorHandle<Cmd>
where
	Cmd: Send + 'static,
{
	fn drop(&mut self) {
		self.tx.close();
	}
}

impl<Cmd> ActorHandle<Cmd>
where
	Cmd: Send + 'static,
{
	/// Actor name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Worker class.
	pub const fn class(&self) -> TaskClass {
		self.class
	}

	/// Enqueues one command behind every command sent before it.
	pub fn send(&self, cmd: Cmd) -> Result<(), MailboxClosed<Cmd>> {
		self.tx.send(cmd)
	}

	/// Number of queued commands the actor has not started yet.
	pub fn pending(&self) -> usize {
		self.tx.len()
	}

	/// Returns true once the actor no longer accepts commands.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	/// Stops accepting commands. Already queued commands still run.
	pub fn close(&self) {
		self.tx.close();
	}

	/// Returns the exit summary if the actor has exited.
	pub fn last_exit(&self) -> Option<ActorExit> {
		self.exit.borrow().clone()
	}

	/// Closes the mailbox and waits for the actor to drain and exit.
	pub async fn shutdown(&self) -> Option<ActorExit> {
		self.tx.close();
		let mut exit = self.exit.clone();
		match exit.wait_for(Option::is_some).await {
			Ok(exit) => exit.clone(),
			Err(_) => None,
		}
	}
}

/// Spawns an actor and its supervising task.
pub fn spawn_actor<A>(name: impl Into<Arc<str>>, class: TaskClass, actor: A) -> ActorHandle<A::Cmd>
where
	A: WorkerActor,
{
	let name = name.into();
	let mailbox = Mailbox::new();
	let tx = mailbox.sender();
	let rx = Arc::new(mailbox.into_receiver());
	let (exit_tx, exit_rx) = watch::channel(None);

	let task_name = Arc::clone(&name);
	let task_rx = Arc::clone(&rx);
	crate::spawn(class, async move {
		let child = crate::spawn(class, run_actor(actor, rx));
		let exit = match child.await {
			Ok(kind) => ActorExit { kind, message: None },
			Err(err) => ActorExit::from_join_error(err),
		};

		let discarded = task_rx.close_and_discard();
		if exit.is_failure() {
			tracing::error!(
				actor = %task_name,
				class = class.as_str(),
				kind = ?exit.kind,
				message = exit.message.as_deref().unwrap_or(""),
				discarded,
				"worker.actor.failed"
			);
		} else {
			tracing::debug!(actor = %task_name, class = class.as_str(), kind = ?exit.kind, discarded, "worker.actor.exit");
		}
		let _ = exit_tx.send(Some(exit));
	});

	ActorHandle {
		name,
		class,
		tx,
		exit: exit_rx,
	}
}

async fn run_actor<A>(mut actor: A, rx: Arc<MailboxReceiver<A::Cmd>>) -> ActorExitKind
where
	A: WorkerActor,
{
	let kind = loop {
		let Some(cmd) = rx.recv().await else {
			break ActorExitKind::MailboxClosed;
		};
		let step = GuardedStep {
			step: Some(actor.handle(cmd)),
			rx: rx.as_ref(),
		};
		if step.await == ActorFlow::Stop {
			break ActorExitKind::Stopped;
		}
	};

	actor.on_stop().await;
	kind
}

type StepFuture<'a> = Pin<Box<dyn Future<Output = ActorFlow> + Send + 'a>>;

/// One `handle` call. If it panics, the mailbox is closed before the step's
/// state (and any reply channel it owns) is dropped, so a caller that sees
/// its reply vanish also sees the actor as closed.
struct GuardedStep<'a, Cmd> {
	step: Option<StepFuture<'a>>,
	rx: &'a MailboxReceiver<Cmd>,
}

impl<Cmd> Future for GuardedStep<'_, Cmd> {
	type Output = ActorFlow;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ActorFlow> {
		let this = self.get_mut();
		let Some(step) = this.step.as_mut() else {
			return Poll::Ready(ActorFlow::Stop);
		};
		match panic::catch_unwind(AssertUnwindSafe(|| step.as_mut().poll(cx))) {
			Ok(poll) => poll,
			Err(payload) => {
				this.rx.close();
				this.step = None;
				panic::resume_unwind(payload)
			}
		}
	}
}

#[cfg(test)]
mod tests;
