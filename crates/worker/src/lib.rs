//! Task runtime primitives shared by the history engine.
//!
//! * [`TaskClass`] tags spawned work for tracing.
//! * [`spawn`] routes tasks onto the ambient runtime, falling back to a shared one.
//! * [`Mailbox`] is an unbounded FIFO queue whose enqueue never awaits.
//! * [`spawn_actor`] runs a [`WorkerActor`] that handles commands one at a time.

pub mod actor;
mod class;
pub mod mailbox;
mod spawn;

pub use actor::{ActorExit, ActorExitKind, ActorFlow, ActorHandle, WorkerActor, join_error_panic_message, spawn_actor};
pub use class::TaskClass;
pub use mailbox::{Mailbox, MailboxClosed, MailboxReceiver, MailboxSender};
pub use spawn::spawn;
