use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Mailbox send error. Hands the rejected message back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxClosed<T>(pub T);

impl<T> std::fmt::Display for MailboxClosed<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "mailbox closed")
	}
}

impl<T: std::fmt::Debug> std::error::Error for MailboxClosed<T> {}

struct MailboxState<T> {
	queue: VecDeque<T>,
	closed: bool,
}

struct MailboxInner<T> {
	state: Mutex<MailboxState<T>>,
	notify_recv: Notify,
}

/// Multi-producer mailbox sender.
pub struct MailboxSender<T> {
	inner: Arc<MailboxInner<T>>,
}

/// Single-consumer mailbox receiver.
pub struct MailboxReceiver<T> {
	inner: Arc<MailboxInner<T>>,
}

/// Unbounded FIFO mailbox with synchronous enqueue.
///
/// Enqueue never awaits, so the order in which messages land is the order in
/// which `send` was called. The receiver drains them strictly front to back.
pub struct Mailbox<T> {
	inner: Arc<MailboxInner<T>>,
}

impl<T> Clone for MailboxSender<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> Default for Mailbox<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Mailbox<T> {
	/// Creates an empty open mailbox.
	pub fn new() -> Self {
		Self {
			inner: Arc::new(MailboxInner {
				state: Mutex::new(MailboxState {
					queue: VecDeque::new(),
					closed: false,
				}),
				notify_recv: Notify::new(),
			}),
		}
	}

	/// Returns a sender handle.
	pub fn sender(&self) -> MailboxSender<T> {
		MailboxSender {
			inner: Arc::clone(&self.inner),
		}
	}

	/// Consumes the mailbox into its receiver.
	pub fn into_receiver(self) -> MailboxReceiver<T> {
		MailboxReceiver { inner: self.inner }
	}
}

impl<T> MailboxSender<T> {
	/// Appends one message to the back of the queue.
	pub fn send(&self, msg: T) -> Result<(), MailboxClosed<T>> {
		let mut state = self.inner.state.lock();
		if state.closed {
			return Err(MailboxClosed(msg));
		}
		state.queue.push_back(msg);
		drop(state);
		self.inner.notify_recv.notify_one();
		Ok(())
	}

	/// Requests closure. The receiver drains queued items, then sees `None`.
	pub fn close(&self) {
		close(&self.inner);
	}

	/// Returns true once the mailbox has been closed from either side.
	pub fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}

	/// Number of queued messages not yet received.
	pub fn len(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<T> MailboxReceiver<T> {
	/// Waits for the next message. Returns `None` once closed and drained.
	pub async fn recv(&self) -> Option<T> {
		loop {
			let notified = self.inner.notify_recv.notified();
			{
				let mut state = self.inner.state.lock();
				if let Some(msg) = state.queue.pop_front() {
					return Some(msg);
				}
				if state.closed {
					return None;
				}
			}
			notified.await;
		}
	}

	/// Stops accepting messages. Already queued messages stay queued.
	pub fn close(&self) {
		close(&self.inner);
	}

	/// Closes the mailbox and drops every queued message without delivering it.
	pub fn close_and_discard(&self) -> usize {
		let discarded = {
			let mut state = self.inner.state.lock();
			state.closed = true;
			std::mem::take(&mut state.queue)
		};
		let count = discarded.len();
		drop(discarded);
		self.inner.notify_recv.notify_waiters();
		count
	}
}

impl<T> Drop for MailboxReceiver<T> {
	fn drop(&mut self) {
		self.close_and_discard();
	}
}

fn close<T>(inner: &MailboxInner<T>) {
	inner.state.lock().closed = true;
	inner.notify_recv.notify_waiters();
	inner.notify_recv.notify_one();
}
