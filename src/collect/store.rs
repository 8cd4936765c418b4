use std::collections::HashMap;
use std::sync::Mutex;

use super::IndexPage;

/// Pages already retrieved, keyed by the URL they were requested with.
pub trait PageStore: Send + Sync {
    fn get(&self, url: &str) -> Option<IndexPage>;
    fn put(&self, requested_url: &str, page: IndexPage);
}

#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: Mutex<HashMap<String, IndexPage>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, IndexPage>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PageStore for MemoryPageStore {
    fn get(&self, url: &str) -> Option<IndexPage> {
        self.lock().get(url).cloned()
    }

    fn put(&self, requested_url: &str, page: IndexPage) {
        self.lock().insert(requested_url.to_string(), page);
    }
}
