#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use atlas_history::Changeset;
use parking_lot::Mutex;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Stand-in for a scarce external resource such as generated object URLs.
///
/// Tracks which handles are live and how many times each was freed.
#[derive(Clone, Default)]
pub struct UrlPool {
	next: Arc<AtomicU64>,
	live: Arc<Mutex<HashMap<u64, String>>>,
	frees: Arc<Mutex<HashMap<u64, usize>>>,
	/// Tags of layers currently shown on the map, in draw order.
	pub map: Arc<Mutex<Vec<u64>>>,
}

impl UrlPool {
	pub fn allocate(&self) -> u64 {
		let handle = self.next.fetch_add(1, Ordering::SeqCst) + 1;
		self.live.lock().insert(handle, format!("blob:atlas/{handle}"));
		handle
	}

	fn free(&self, handle: u64) {
		self.live.lock().remove(&handle);
		*self.frees.lock().entry(handle).or_default() += 1;
	}

	pub fn live(&self) -> usize {
		self.live.lock().len()
	}

	pub fn frees(&self, handle: u64) -> usize {
		self.frees.lock().get(&handle).copied().unwrap_or(0)
	}

	pub fn max_frees(&self) -> usize {
		self.frees.lock().values().copied().max().unwrap_or(0)
	}

	/// Builds a changeset that adds an image layer backed by a fresh URL.
	pub fn add_image_layer(&self) -> AddImageLayer {
		AddImageLayer {
			handle: self.allocate(),
			pool: self.clone(),
		}
	}
}

/// Adds a layer to the map; its URL lives until the changeset is released.
pub struct AddImageLayer {
	handle: u64,
	pool: UrlPool,
}

impl AddImageLayer {
	pub fn handle(&self) -> u64 {
		self.handle
	}
}

#[async_trait]
impl Changeset for AddImageLayer {
	async fn apply(&mut self) -> anyhow::Result<()> {
		anyhow::ensure!(self.pool.live.lock().contains_key(&self.handle), "url {} used after release", self.handle);
		tokio::task::yield_now().await;
		self.pool.map.lock().push(self.handle);
		Ok(())
	}

	async fn revert(&mut self) -> anyhow::Result<()> {
		tokio::task::yield_now().await;
		let mut map = self.pool.map.lock();
		let pos = map.iter().rposition(|h| *h == self.handle);
		anyhow::ensure!(pos.is_some(), "layer {} is not on the map", self.handle);
		if let Some(pos) = pos {
			map.remove(pos);
		}
		Ok(())
	}

	async fn release(self: Box<Self>) -> anyhow::Result<()> {
		self.pool.free(self.handle);
		Ok(())
	}

	fn label(&self) -> &'static str {
		"add_image_layer"
	}
}
