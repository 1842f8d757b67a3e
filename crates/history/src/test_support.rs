//! Scripted changesets that record every call into a shared ledger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::Changeset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
	Apply(u32),
	Revert(u32),
	Release(u32),
}

/// Shared record of calls plus a "document" that applied probes append to.
#[derive(Clone, Default)]
pub(crate) struct Ledger {
	calls: Arc<Mutex<Vec<Call>>>,
	doc: Arc<Mutex<Vec<u32>>>,
}

impl Ledger {
	pub fn probe(&self, tag: u32) -> Probe {
		Probe {
			tag,
			ledger: self.clone(),
			fail_apply: false,
			fail_revert: false,
			fail_release: false,
			delay: None,
		}
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn released(&self) -> Vec<u32> {
		self.calls
			.lock()
			.iter()
			.filter_map(|c| match c {
				Call::Release(tag) => Some(*tag),
				_ => None,
			})
			.collect()
	}

	pub fn doc(&self) -> Vec<u32> {
		self.doc.lock().clone()
	}
}

pub(crate) struct Probe {
	tag: u32,
	ledger: Ledger,
	pub fail_apply: bool,
	pub fail_revert: bool,
	pub fail_release: bool,
	pub delay: Option<Duration>,
}

impl Probe {
	pub fn failing_apply(mut self) -> Self {
		self.fail_apply = true;
		self
	}

	pub fn failing_revert(mut self) -> Self {
		self.fail_revert = true;
		self
	}

	pub fn failing_release(mut self) -> Self {
		self.fail_release = true;
		self
	}

	pub fn slow(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	async fn pause(&self) {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
	}
}

#[async_trait]
impl Changeset for Probe {
	async fn apply(&mut self) -> anyhow::Result<()> {
		self.pause().await;
		self.ledger.calls.lock().push(Call::Apply(self.tag));
		if self.fail_apply {
			anyhow::bail!("probe {} refused to apply", self.tag);
		}
		self.ledger.doc.lock().push(self.tag);
		Ok(())
	}

	async fn revert(&mut self) -> anyhow::Result<()> {
		self.pause().await;
		self.ledger.calls.lock().push(Call::Revert(self.tag));
		if self.fail_revert {
			anyhow::bail!("probe {} refused to revert", self.tag);
		}
		let mut doc = self.ledger.doc.lock();
		if let Some(pos) = doc.iter().rposition(|t| *t == self.tag) {
			doc.remove(pos);
		}
		Ok(())
	}

	async fn release(self: Box<Self>) -> anyhow::Result<()> {
		self.ledger.calls.lock().push(Call::Release(self.tag));
		if self.fail_release {
			anyhow::bail!("probe {} leaked", self.tag);
		}
		Ok(())
	}

	fn label(&self) -> &'static str {
		"probe"
	}
}
