use std::sync::atomic::{AtomicU64, Ordering};

/// Diagnostic identity assigned to a changeset when it is handed to the
/// service. Never consulted by the engine's own logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangesetId(u64);

impl ChangesetId {
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl std::fmt::Display for ChangesetId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Monotonic id clock starting at 1.
#[derive(Debug, Default)]
pub(crate) struct IdClock {
	next: AtomicU64,
}

impl IdClock {
	pub fn next(&self) -> ChangesetId {
		ChangesetId(self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}
}

#[cfg(test)]
impl ChangesetId {
	pub(crate) const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}
}
