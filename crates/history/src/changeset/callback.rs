use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use super::Changeset;

type RevertFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type RevertFn = Box<dyn FnMut() -> RevertFuture + Send>;

/// Changeset whose forward effect is nothing and whose revert runs a
/// compensating callback.
///
/// Used to hook cleanup into the undo direction without writing a full
/// changeset. Releasing drops the callback, so it cannot run again.
pub struct RevertHook {
	label: &'static str,
	callback: RevertFn,
}

impl RevertHook {
	/// Wraps a synchronous callback.
	pub fn new(mut callback: impl FnMut() -> anyhow::Result<()> + Send + 'static) -> Self {
		Self::new_async(move || std::future::ready(callback()))
	}

	/// Wraps a callback returning a future.
	pub fn new_async<F, Fut>(mut callback: F) -> Self
	where
		F: FnMut() -> Fut + Send + 'static,
		Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
	{
		Self {
			label: "revert_hook",
			callback: Box::new(move || Box::pin(callback())),
		}
	}

	#[must_use]
	pub fn labeled(mut self, label: &'static str) -> Self {
		self.label = label;
		self
	}
}

#[async_trait]
impl Changeset for RevertHook {
	async fn apply(&mut self) -> anyhow::Result<()> {
		Ok(())
	}

	async fn revert(&mut self) -> anyhow::Result<()> {
		(self.callback)().await
	}

	async fn release(self: Box<Self>) -> anyhow::Result<()> {
		let Self { callback, .. } = *self;
		drop(callback);
		Ok(())
	}

	fn label(&self) -> &'static str {
		self.label
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[tokio::test]
	async fn apply_is_noop_and_revert_runs_callback_each_time() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let mut hook = RevertHook::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});

		hook.apply().await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		hook.revert().await.unwrap();
		hook.apply().await.unwrap();
		hook.revert().await.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn release_drops_captured_state() {
		let captured = Arc::new(());
		let held = Arc::clone(&captured);
		let hook = RevertHook::new(move || {
			let _ = &held;
			Ok(())
		});
		assert_eq!(Arc::strong_count(&captured), 2);
		Box::new(hook).release().await.unwrap();
		assert_eq!(Arc::strong_count(&captured), 1);
	}

	#[tokio::test]
	async fn async_callback_errors_propagate() {
		let mut hook = RevertHook::new_async(|| async { Err::<(), _>(anyhow::anyhow!("tile cache gone")) }).labeled("drop_tiles");
		assert_eq!(hook.label(), "drop_tiles");
		let err = hook.revert().await.unwrap_err();
		assert_eq!(err.to_string(), "tile cache gone");
	}
}
