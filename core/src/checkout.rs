// core/src/checkout.rs

//! Order placement.
//!
//! An order is validated against live stock and persisted in one store
//! transaction: stock decrements, the order header, its lines, the pending
//! payment and (for cart checkouts) the consumed cart lines either all commit
//! or none do.

use crate::error::{BookstoreError, Result};
use crate::model::{Book, Order, OrderDetail, OrderItemView, OrderLine, OrderStatus, Payment, PaymentMethod};
use crate::store::{BookstoreStore, StockUpdate, StoreTx};
use crate::Money;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
  pub book_id: Uuid,
  pub quantity: i32,
}

/// Where the requested items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSource {
  #[default]
  Direct,
  /// Items were read from the customer's cart; the matching cart lines are
  /// removed in the order transaction.
  Cart,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
  pub customer_id: Uuid,
  pub items: Vec<OrderItemRequest>,
  pub note: Option<String>,
  pub payment_method: PaymentMethod,
  /// Employee placing the order on the customer's behalf.
  pub handled_by: Option<Uuid>,
  pub source: OrderSource,
}

#[derive(Debug, Clone, Default)]
pub struct CartCheckout {
  pub customer_id: Uuid,
  pub note: Option<String>,
  pub payment_method: PaymentMethod,
  pub handled_by: Option<Uuid>,
}

/// A book with its locked stock, ready to be written as an order line.
struct ReservedLine {
  book: Book,
  quantity: i32,
  line_total: Money,
}

/// Merges duplicate books and rejects malformed quantities.
fn normalize_items(items: &[OrderItemRequest]) -> Result<Vec<OrderItemRequest>> {
  if items.is_empty() {
    return Err(BookstoreError::InvalidOrder("An order needs at least one item".to_string()));
  }
  let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
  for item in items {
    if item.quantity <= 0 {
      return Err(BookstoreError::InvalidOrder(format!(
        "Quantity for book {} must be at least 1 (got {})",
        item.book_id, item.quantity
      )));
    }
    match merged.iter_mut().find(|existing| existing.book_id == item.book_id) {
      Some(existing) => {
        existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
          BookstoreError::InvalidOrder(format!("Quantity for book {} is too large", item.book_id))
        })?;
      }
      None => merged.push(*item),
    }
  }
  Ok(merged)
}

fn clean_note(note: Option<String>) -> Option<String> {
  note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Locks, checks and decrements every requested book.
///
/// Rows are locked in ascending id order so concurrent orders over the same
/// books always queue in the same order.
#[instrument(name = "checkout::reserve_stock", skip(tx, items), fields(lines = items.len()))]
async fn reserve_stock(tx: &mut dyn StoreTx, items: &[OrderItemRequest]) -> Result<Vec<ReservedLine>> {
  let mut lock_order: Vec<&OrderItemRequest> = items.iter().collect();
  lock_order.sort_by_key(|item| item.book_id);

  let mut reserved: HashMap<Uuid, Book> = HashMap::with_capacity(items.len());
  for item in lock_order {
    let book = tx
      .lock_book(item.book_id)
      .await?
      .ok_or(BookstoreError::BookNotFound { book_id: item.book_id })?;

    if book.stock_quantity < item.quantity {
      warn!(
        "Checkout: book {} has {} in stock, {} requested.",
        book.id, book.stock_quantity, item.quantity
      );
      return Err(BookstoreError::InsufficientStock {
        book_id: book.id,
        title: book.title,
        available: book.stock_quantity,
        requested: item.quantity,
      });
    }

    match tx.decrement_stock(book.id, item.quantity).await? {
      StockUpdate::Decremented { remaining } => {
        info!("Checkout: reserved {} of book {}, {} left.", item.quantity, book.id, remaining);
      }
      StockUpdate::Insufficient => {
        warn!("Checkout: conditional decrement of book {} matched no row.", book.id);
        return Err(BookstoreError::InsufficientStock {
          book_id: book.id,
          title: book.title,
          available: book.stock_quantity,
          requested: item.quantity,
        });
      }
    }
    reserved.insert(book.id, book);
  }

  // Back to request order for the persisted lines.
  items
    .iter()
    .map(|item| {
      let book = reserved
        .remove(&item.book_id)
        .ok_or(BookstoreError::BookNotFound { book_id: item.book_id })?;
      let line_total = book
        .price
        .checked_mul(Money::from(item.quantity))
        .ok_or_else(|| BookstoreError::InvalidOrder(format!("Line total for book {} overflows", book.id)))?;
      Ok(ReservedLine {
        book,
        quantity: item.quantity,
        line_total,
      })
    })
    .collect()
}

#[instrument(name = "checkout::persist_order", skip_all, fields(customer_id = %request.customer_id))]
async fn persist_order(tx: &mut dyn StoreTx, request: &PlaceOrder, lines: Vec<ReservedLine>) -> Result<OrderDetail> {
  let total = lines.iter().try_fold(0 as Money, |acc, line| acc.checked_add(line.line_total));
  let total = total.ok_or_else(|| BookstoreError::InvalidOrder("Order total overflows".to_string()))?;

  let order = Order {
    id: Uuid::new_v4(),
    customer_id: request.customer_id,
    handled_by: request.handled_by,
    total,
    status: OrderStatus::PendingConfirmation,
    note: clean_note(request.note.clone()),
    created_at: Utc::now(),
  };
  tx.insert_order(&order).await?;
  info!("Checkout (Order {}): header written, total {}.", order.id, total);

  let mut items = Vec::with_capacity(lines.len());
  for line in lines {
    let order_line = OrderLine {
      order_id: order.id,
      book_id: line.book.id,
      quantity: line.quantity,
      unit_price: line.book.price,
      line_total: line.line_total,
    };
    tx.insert_order_line(&order_line).await?;
    items.push(OrderItemView {
      book_id: line.book.id,
      title: line.book.title,
      author: line.book.author,
      cover_image: line.book.cover_image,
      unit_price: order_line.unit_price,
      quantity: order_line.quantity,
      line_total: order_line.line_total,
    });
  }

  let payment = Payment::pending(order.id, request.payment_method, total);
  tx.insert_payment(&payment).await?;
  info!(
    "Checkout (Order {}): {} line(s) and a {} payment written.",
    order.id,
    items.len(),
    payment.method
  );

  if request.source == OrderSource::Cart {
    let book_ids: Vec<Uuid> = items.iter().map(|item| item.book_id).collect();
    let removed = tx.remove_cart_lines(request.customer_id, &book_ids).await?;
    info!("Checkout (Order {}): removed {} cart line(s).", order.id, removed);
  }

  Ok(OrderDetail {
    order,
    items,
    payment: Some(payment),
  })
}

/// Customers with a deactivated profile cannot order. Customers the store
/// has no profile for are accepted.
async fn ensure_customer_can_order(store: &dyn BookstoreStore, customer_id: Uuid) -> Result<()> {
  match store.get_customer(customer_id).await? {
    Some(customer) if !customer.active => {
      warn!("Checkout: customer {} is deactivated.", customer_id);
      Err(BookstoreError::CustomerInactive { customer_id })
    }
    _ => Ok(()),
  }
}

async fn place_in_tx(tx: &mut dyn StoreTx, request: &PlaceOrder, items: &[OrderItemRequest]) -> Result<OrderDetail> {
  let lines = reserve_stock(tx, items).await?;
  persist_order(tx, request, lines).await
}

/// Reads the cart under the transaction's lock so the lines that are ordered
/// are exactly the lines that get removed.
async fn checkout_in_tx(tx: &mut dyn StoreTx, checkout: CartCheckout) -> Result<OrderDetail> {
  let cart = tx.lock_cart_lines(checkout.customer_id).await?;
  if cart.is_empty() {
    return Err(BookstoreError::InvalidOrder("The cart is empty".to_string()));
  }
  info!("Checkout: converting {} cart line(s).", cart.len());

  let request = PlaceOrder {
    customer_id: checkout.customer_id,
    items: cart
      .iter()
      .map(|line| OrderItemRequest {
        book_id: line.book_id,
        quantity: line.quantity,
      })
      .collect(),
    note: checkout.note,
    payment_method: checkout.payment_method,
    handled_by: checkout.handled_by,
    source: OrderSource::Cart,
  };
  let items = normalize_items(&request.items)?;
  place_in_tx(tx, &request, &items).await
}

/// Commits a successful outcome, rolls back a failed one.
async fn finish(tx: Box<dyn StoreTx>, outcome: Result<OrderDetail>, customer_id: Uuid) -> Result<OrderDetail> {
  match outcome {
    Ok(detail) => {
      tx.commit().await?;
      info!(
        "Checkout (Order {}): committed for customer {}.",
        detail.order.id, detail.order.customer_id
      );
      Ok(detail)
    }
    Err(err) => {
      warn!("Checkout for customer {} aborted: {}", customer_id, err);
      if let Err(rollback_err) = tx.rollback().await {
        error!("Checkout rollback failed: {}", rollback_err);
      }
      Err(err)
    }
  }
}

/// Places an order atomically and returns it fully hydrated.
#[instrument(
  name = "checkout::place_order",
  skip(store, request),
  fields(customer_id = %request.customer_id, requested_lines = request.items.len(), source = ?request.source)
)]
pub async fn place_order(store: &dyn BookstoreStore, request: PlaceOrder) -> Result<OrderDetail> {
  let items = normalize_items(&request.items)?;
  ensure_customer_can_order(store, request.customer_id).await?;

  let mut tx = store.begin().await?;
  let outcome = place_in_tx(tx.as_mut(), &request, &items).await;
  finish(tx, outcome, request.customer_id).await
}

/// Turns the customer's whole cart into an order.
#[instrument(name = "checkout::checkout_cart", skip(store, checkout), fields(customer_id = %checkout.customer_id))]
pub async fn checkout_cart(store: &dyn BookstoreStore, checkout: CartCheckout) -> Result<OrderDetail> {
  let customer_id = checkout.customer_id;
  ensure_customer_can_order(store, customer_id).await?;

  let mut tx = store.begin().await?;
  let outcome = checkout_in_tx(tx.as_mut(), checkout).await;
  finish(tx, outcome, customer_id).await
}
