// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use bookstore_core::{
  place_order, Actor, Book, BookstoreStore, InMemoryStore, NewBook, OrderDetail, OrderItemRequest, PlaceOrder,
  Result, StaffRole,
};
use uuid::Uuid;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bookstore_core=debug")),
    )
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn new_store() -> InMemoryStore {
  setup_tracing();
  InMemoryStore::new()
}

pub fn book_input(title: &str, price: i64, stock: i32) -> NewBook {
  NewBook {
    title: title.to_string(),
    author: format!("Author of {}", title),
    genre: None,
    description: None,
    category_id: None,
    price,
    stock_quantity: stock,
    cover_image: None,
  }
}

pub async fn seed_book(store: &InMemoryStore, title: &str, price: i64, stock: i32) -> Book {
  store
    .insert_book(book_input(title, price, stock))
    .await
    .expect("seeding a book should succeed")
}

pub async fn stock_of(store: &InMemoryStore, book_id: Uuid) -> i32 {
  store
    .get_book(book_id)
    .await
    .expect("store read")
    .expect("book exists")
    .stock_quantity
}

pub fn items(pairs: &[(Uuid, i32)]) -> Vec<OrderItemRequest> {
  pairs
    .iter()
    .map(|&(book_id, quantity)| OrderItemRequest { book_id, quantity })
    .collect()
}

pub async fn order(store: &InMemoryStore, customer_id: Uuid, pairs: &[(Uuid, i32)]) -> Result<OrderDetail> {
  place_order(
    store,
    PlaceOrder {
      customer_id,
      items: items(pairs),
      ..Default::default()
    },
  )
  .await
}

pub fn customer(customer_id: Uuid) -> Actor {
  Actor::Customer { customer_id }
}

pub fn clerk() -> Actor {
  Actor::Staff {
    employee_id: Uuid::new_v4(),
    role: StaffRole::Clerk,
  }
}

pub fn admin() -> Actor {
  Actor::Staff {
    employee_id: Uuid::new_v4(),
    role: StaffRole::Admin,
  }
}

pub fn manager() -> Actor {
  Actor::Staff {
    employee_id: Uuid::new_v4(),
    role: StaffRole::Manager,
  }
}
