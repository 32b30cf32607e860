use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex},
};

/// Bounded in-process cache from exact query text to embedding vector.
/// FIFO eviction; a capacity of zero disables caching entirely.
#[derive(Clone)]
pub struct EmbedCache {
	capacity: usize,
	inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
	entries: HashMap<String, Vec<f32>>,
	order: VecDeque<String>,
}

impl EmbedCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			inner: Arc::new(Mutex::new(CacheInner {
				entries: HashMap::new(),
				order: VecDeque::new(),
			})),
		}
	}

	pub fn get(&self, text: &str) -> Option<Vec<f32>> {
		if self.capacity == 0 {
			return None;
		}

		let inner = self.lock();

		inner.entries.get(text).cloned()
	}

	pub fn put(&self, text: &str, vector: Vec<f32>) {
		if self.capacity == 0 {
			return;
		}

		let mut inner = self.lock();

		if inner.entries.insert(text.to_string(), vector).is_none() {
			inner.order.push_back(text.to_string());
		}

		while inner.entries.len() > self.capacity {
			let Some(oldest) = inner.order.pop_front() else { break };

			inner.entries.remove(&oldest);
		}
	}

	pub fn len(&self) -> usize {
		self.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}
