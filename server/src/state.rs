// server/src/state.rs
use bookstore_core::BookstoreStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  /// PostgreSQL in production, the in-memory store in tests.
  pub store: Arc<dyn BookstoreStore>,
}

impl AppState {
  pub fn new(store: Arc<dyn BookstoreStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &dyn BookstoreStore {
    self.store.as_ref()
  }
}
