use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;

use super::*;

struct Recorder {
	seen: Arc<parking_lot::Mutex<Vec<u32>>>,
	stops: Arc<AtomicUsize>,
}

#[async_trait]
impl WorkerActor for Recorder {
	type Cmd = (u32, Option<oneshot::Sender<()>>);

	async fn handle(&mut self, (value, done): Self::Cmd) -> ActorFlow {
		tokio::time::sleep(Duration::from_millis(1)).await;
		self.seen.lock().push(value);
		if let Some(done) = done {
			let _ = done.send(());
		}
		if value == 99 { ActorFlow::Stop } else { ActorFlow::Continue }
	}

	async fn on_stop(&mut self) {
		self.stops.fetch_add(1, Ordering::SeqCst);
	}
}

fn recorder() -> (Recorder, Arc<parking_lot::Mutex<Vec<u32>>>, Arc<AtomicUsize>) {
	let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let stops = Arc::new(AtomicUsize::new(0));
	(
		Recorder {
			seen: Arc::clone(&seen),
			stops: Arc::clone(&stops),
		},
		seen,
		stops,
	)
}

#[tokio::test]
async fn handles_commands_in_send_order() {
	let (actor, seen, _) = recorder();
	let handle = spawn_actor("recorder", TaskClass::Interactive, actor);
	assert_eq!(handle.name(), "recorder");
	assert_eq!(handle.class(), TaskClass::Interactive);
	for i in 0..10 {
		handle.send((i, None)).unwrap();
	}
	let (tx, rx) = oneshot::channel();
	handle.send((10, Some(tx))).unwrap();
	rx.await.unwrap();
	assert_eq!(*seen.lock(), (0..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn shutdown_drains_queue_and_runs_on_stop() {
	let (actor, seen, stops) = recorder();
	let handle = spawn_actor("recorder", TaskClass::Background, actor);
	handle.send((1, None)).unwrap();
	handle.send((2, None)).unwrap();
	let exit = handle.shutdown().await.expect("actor should report exit");
	assert_eq!(exit.kind(), ActorExitKind::MailboxClosed);
	assert_eq!(*seen.lock(), vec![1, 2]);
	assert_eq!(stops.load(Ordering::SeqCst), 1);
	assert!(handle.send((3, None)).is_err());
}

#[tokio::test]
async fn stop_flow_discards_remaining_commands() {
	let (actor, seen, stops) = recorder();
	let handle = spawn_actor("recorder", TaskClass::Interactive, actor);
	handle.send((99, None)).unwrap();
	let (tx, rx) = oneshot::channel();
	let _ = handle.send((5, Some(tx)));
	assert!(rx.await.is_err(), "queued command behind a stop must be dropped");
	let exit = handle.shutdown().await.unwrap();
	assert_eq!(exit.kind(), ActorExitKind::Stopped);
	assert_eq!(*seen.lock(), vec![99]);
	assert_eq!(stops.load(Ordering::SeqCst), 1);
}

struct Exploding;

#[async_trait]
impl WorkerActor for Exploding {
	type Cmd = oneshot::Sender<()>;

	async fn handle(&mut self, _cmd: Self::Cmd) -> ActorFlow {
		panic!("boom-actor");
	}
}

#[tokio::test]
async fn panic_is_recorded_and_closes_mailbox() {
	let handle = spawn_actor("exploding", TaskClass::Interactive, Exploding);
	let (first, first_rx) = oneshot::channel();
	handle.send(first).unwrap();
	assert!(first_rx.await.is_err());
	assert!(handle.is_closed(), "mailbox closes before the in-flight reply is dropped");
	let (late, _late_rx) = oneshot::channel();
	assert!(handle.send(late).is_err());

	let exit = tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
		.await
		.expect("shutdown should not hang")
		.expect("exit recorded");
	assert_eq!(exit.kind(), ActorExitKind::Panicked);
	assert!(exit.message().unwrap_or_default().contains("boom-actor"));
	assert!(exit.is_failure());
	assert!(handle.is_closed());
}

#[tokio::test]
#[allow(clippy::disallowed_methods)]
async fn panic_message_extraction() {
	let handle = tokio::spawn(async { panic!("{}", String::from("boom-string")) });
	let err = handle.await.unwrap_err();
	assert_eq!(join_error_panic_message(err).as_deref(), Some("boom-string"));

	let handle = tokio::spawn(async {
		tokio::time::sleep(Duration::from_secs(60)).await;
	});
	handle.abort();
	let err = handle.await.unwrap_err();
	assert!(join_error_panic_message(err).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_step_closes_mailbox_before_reply_drops() {
	for _ in 0..100 {
		let handle = spawn_actor("exploding", TaskClass::Interactive, Exploding);
		let (tx, rx) = oneshot::channel();
		handle.send(tx).unwrap();
		assert!(rx.await.is_err());
		assert!(handle.is_closed());
	}
}
