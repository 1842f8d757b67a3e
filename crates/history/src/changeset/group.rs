use anyhow::Context;
use async_trait::async_trait;
use tracing::warn;

use super::Changeset;

/// One user action made of several ordered changesets.
///
/// The group occupies a single stack entry. Apply is all-or-nothing: when a
/// child fails, the children already applied are reverted newest first and
/// the failure is returned. Revert walks the children in reverse and keeps
/// going past failures, returning the first one.
pub struct ChangesetGroup {
	label: &'static str,
	children: Vec<Box<dyn Changeset>>,
}

impl ChangesetGroup {
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			children: Vec::new(),
		}
	}

	#[must_use]
	pub fn with(mut self, child: impl Changeset) -> Self {
		self.push(child);
		self
	}

	pub fn push(&mut self, child: impl Changeset) {
		self.children.push(Box::new(child));
	}

	pub fn push_boxed(&mut self, child: Box<dyn Changeset>) {
		self.children.push(child);
	}

	pub fn len(&self) -> usize {
		self.children.len()
	}

	pub fn is_empty(&self) -> bool {
		self.children.is_empty()
	}
}

#[async_trait]
impl Changeset for ChangesetGroup {
	async fn apply(&mut self) -> anyhow::Result<()> {
		for index in 0..self.children.len() {
			let Err(err) = self.children[index].apply().await else {
				continue;
			};
			for undo in self.children[..index].iter_mut().rev() {
				if let Err(rollback) = undo.revert().await {
					warn!(group = self.label, child = undo.label(), error = %rollback, "history.group.rollback_failed");
				}
			}
			let child = self.children[index].label();
			return Err(err.context(format!("{} step {index} ({child}) failed to apply", self.label)));
		}
		Ok(())
	}

	async fn revert(&mut self) -> anyhow::Result<()> {
		let mut first_err = None;
		for (index, child) in self.children.iter_mut().enumerate().rev() {
			if let Err(err) = child.revert().await {
				warn!(group = self.label, child = child.label(), error = %err, "history.group.revert_failed");
				first_err.get_or_insert_with(|| err.context(format!("{} step {index} failed to revert", self.label)));
			}
		}
		first_err.map_or(Ok(()), Err)
	}

	async fn release(self: Box<Self>) -> anyhow::Result<()> {
		let Self { label, children } = *self;
		let total = children.len();
		let mut failed = 0usize;
		let mut first_err = None;
		for child in children {
			if let Err(err) = child.release().await {
				failed += 1;
				first_err.get_or_insert(err);
			}
		}
		match first_err {
			Some(err) => Err(err).with_context(|| format!("{failed} of {total} steps in {label} failed to release")),
			None => Ok(()),
		}
	}

	fn label(&self) -> &'static str {
		self.label
	}
}
