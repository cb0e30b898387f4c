// core/src/cart.rs

//! Per-customer carts.
//!
//! Every mutation re-checks stock against the resulting quantity, but the
//! check is advisory: nothing is reserved, and checkout validates again.

use crate::error::{BookstoreError, Result};
use crate::model::{Book, CartLine, StockLevel};
use crate::store::BookstoreStore;
use crate::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A cart line joined with the book's current catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
  pub book_id: Uuid,
  pub title: String,
  pub author: String,
  pub cover_image: Option<String>,
  /// Current catalog price, which may differ from the one cached in `line_total`.
  pub unit_price: Money,
  pub quantity: i32,
  pub line_total: Money,
  pub stock_quantity: i32,
  pub stock_level: StockLevel,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
  pub line_count: usize,
  pub total_quantity: i64,
  pub total_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  pub items: Vec<CartItemView>,
  pub summary: CartSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
  pub lines: usize,
  pub quantity: i64,
}

fn ensure_positive(quantity: i32) -> Result<()> {
  if quantity < 1 {
    return Err(BookstoreError::Validation(format!(
      "Quantity must be at least 1 (got {})",
      quantity
    )));
  }
  Ok(())
}

fn ensure_in_stock(book: &Book, wanted: i32) -> Result<()> {
  if wanted > book.stock_quantity {
    warn!(
      "Cart: book {} has {} in stock, {} wanted.",
      book.id, book.stock_quantity, wanted
    );
    return Err(BookstoreError::InsufficientStock {
      book_id: book.id,
      title: book.title.clone(),
      available: book.stock_quantity,
      requested: wanted,
    });
  }
  Ok(())
}

async fn load_book(store: &dyn BookstoreStore, book_id: Uuid) -> Result<Book> {
  store
    .get_book(book_id)
    .await?
    .ok_or(BookstoreError::BookNotFound { book_id })
}

/// Adds `quantity` units, on top of whatever the cart already holds.
#[instrument(name = "cart::add_to_cart", skip(store))]
pub async fn add_to_cart(store: &dyn BookstoreStore, customer_id: Uuid, book_id: Uuid, quantity: i32) -> Result<CartLine> {
  ensure_positive(quantity)?;
  let book = load_book(store, book_id).await?;
  let existing = store
    .cart_line(customer_id, book_id)
    .await?
    .map_or(0, |line| line.quantity);
  let wanted = existing
    .checked_add(quantity)
    .ok_or_else(|| BookstoreError::Validation("Quantity is too large".to_string()))?;
  ensure_in_stock(&book, wanted)?;

  let line = store
    .upsert_cart_line(CartLine::priced(customer_id, book_id, wanted, book.price))
    .await?;
  info!("Cart of customer {}: book {} now x{}.", customer_id, book_id, line.quantity);
  Ok(line)
}

/// Sets an existing line to an absolute quantity.
#[instrument(name = "cart::update_cart_line", skip(store))]
pub async fn update_cart_line(
  store: &dyn BookstoreStore,
  customer_id: Uuid,
  book_id: Uuid,
  quantity: i32,
) -> Result<CartLine> {
  ensure_positive(quantity)?;
  if store.cart_line(customer_id, book_id).await?.is_none() {
    return Err(BookstoreError::CartLineNotFound { book_id });
  }
  let book = load_book(store, book_id).await?;
  ensure_in_stock(&book, quantity)?;

  let line = store
    .upsert_cart_line(CartLine::priced(customer_id, book_id, quantity, book.price))
    .await?;
  info!("Cart of customer {}: book {} set to x{}.", customer_id, book_id, quantity);
  Ok(line)
}

#[instrument(name = "cart::remove_from_cart", skip(store))]
pub async fn remove_from_cart(store: &dyn BookstoreStore, customer_id: Uuid, book_id: Uuid) -> Result<()> {
  if !store.delete_cart_line(customer_id, book_id).await? {
    return Err(BookstoreError::CartLineNotFound { book_id });
  }
  info!("Cart of customer {}: book {} removed.", customer_id, book_id);
  Ok(())
}

#[instrument(name = "cart::clear_cart", skip(store))]
pub async fn clear_cart(store: &dyn BookstoreStore, customer_id: Uuid) -> Result<u64> {
  let removed = store.clear_cart(customer_id).await?;
  info!("Cart of customer {} cleared ({} line(s)).", customer_id, removed);
  Ok(removed)
}

#[instrument(name = "cart::view_cart", skip(store))]
pub async fn view_cart(store: &dyn BookstoreStore, customer_id: Uuid) -> Result<CartView> {
  let lines = store.cart_lines(customer_id).await?;
  let book_ids: Vec<Uuid> = lines.iter().map(|line| line.book_id).collect();
  let books: HashMap<Uuid, Book> = store
    .get_books(&book_ids)
    .await?
    .into_iter()
    .map(|book| (book.id, book))
    .collect();

  let items: Vec<CartItemView> = lines
    .into_iter()
    .filter_map(|line| {
      let book = books.get(&line.book_id)?;
      Some(CartItemView {
        book_id: line.book_id,
        title: book.title.clone(),
        author: book.author.clone(),
        cover_image: book.cover_image.clone(),
        unit_price: book.price,
        quantity: line.quantity,
        line_total: line.line_total,
        stock_quantity: book.stock_quantity,
        stock_level: book.stock_level(),
        updated_at: line.updated_at,
      })
    })
    .collect();

  let summary = CartSummary {
    line_count: items.len(),
    total_quantity: items.iter().map(|item| i64::from(item.quantity)).sum(),
    total_amount: items.iter().fold(0, |acc: Money, item| acc.saturating_add(item.line_total)),
  };
  Ok(CartView { items, summary })
}

#[instrument(name = "cart::cart_count", skip(store))]
pub async fn cart_count(store: &dyn BookstoreStore, customer_id: Uuid) -> Result<CartCount> {
  let lines = store.cart_lines(customer_id).await?;
  Ok(CartCount {
    lines: lines.len(),
    quantity: lines.iter().map(|line| i64::from(line.quantity)).sum(),
  })
}
