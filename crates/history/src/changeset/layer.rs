use std::sync::Arc;

use anyhow::ensure;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;

use super::{SnapshotChangeset, SnapshotTarget};

/// Editable display properties of one map layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
	pub name: String,
	/// In `0.0..=1.0`.
	pub opacity: f32,
	pub attribution: Option<String>,
}

/// Shared handle to a layer's properties plus a refresh revision that views
/// subscribe to.
#[derive(Clone)]
pub struct LayerHandle {
	props: Arc<RwLock<LayerProperties>>,
	revision: Arc<watch::Sender<u64>>,
}

/// Reversible edit of a layer's properties.
pub type LayerPropertiesChangeset = SnapshotChangeset<LayerHandle>;

impl LayerHandle {
	pub fn new(props: LayerProperties) -> Self {
		Self {
			props: Arc::new(RwLock::new(props)),
			revision: Arc::new(watch::Sender::new(0)),
		}
	}

	pub fn get(&self) -> LayerProperties {
		self.props.read().clone()
	}

	/// Number of refreshes issued so far.
	pub fn revision(&self) -> u64 {
		*self.revision.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<u64> {
		self.revision.subscribe()
	}

	/// Builds a changeset that edits this layer's current properties.
	pub fn edit(&self, edit: impl FnOnce(&mut LayerProperties)) -> LayerPropertiesChangeset {
		SnapshotChangeset::capture_then(self.clone(), edit).labeled("layer_properties")
	}
}

#[async_trait]
impl SnapshotTarget for LayerHandle {
	type Snapshot = LayerProperties;

	fn capture(&self) -> LayerProperties {
		self.get()
	}

	async fn write(&self, snapshot: &LayerProperties) -> anyhow::Result<()> {
		ensure!(
			(0.0..=1.0).contains(&snapshot.opacity),
			"layer opacity {} outside 0..=1",
			snapshot.opacity
		);
		*self.props.write() = snapshot.clone();
		Ok(())
	}

	fn refresh(&self) {
		self.revision.send_modify(|rev| *rev += 1);
	}
}
