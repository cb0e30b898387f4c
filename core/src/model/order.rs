// core/src/model/order.rs

use crate::error::BookstoreError;
use crate::model::payment::{Payment, PaymentStatus};
use crate::pagination::PageRequest;
use crate::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order lifecycle. Wire strings are the ones the storefront has always used.
///
/// `ChoXacNhan -> DangXuLy -> DangGiao -> HoanThanh`, with `Huy` reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
  #[default]
  #[serde(rename = "ChoXacNhan")]
  PendingConfirmation,
  #[serde(rename = "DangXuLy")]
  Processing,
  #[serde(rename = "DangGiao")]
  Shipping,
  #[serde(rename = "HoanThanh")]
  Completed,
  #[serde(rename = "Huy")]
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::PendingConfirmation,
    OrderStatus::Processing,
    OrderStatus::Shipping,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::PendingConfirmation => "ChoXacNhan",
      OrderStatus::Processing => "DangXuLy",
      OrderStatus::Shipping => "DangGiao",
      OrderStatus::Completed => "HoanThanh",
      OrderStatus::Cancelled => "Huy",
    }
  }

  /// No transitions leave a terminal state.
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = BookstoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| BookstoreError::Validation(format!("Unknown order status '{}'", s)))
  }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  /// Employee who placed or last moved the order, when it was not the customer.
  pub handled_by: Option<Uuid>,
  pub total: Money,
  pub status: OrderStatus,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// One book-quantity-price entry of an order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub order_id: Uuid,
  pub book_id: Uuid,
  pub quantity: i32,
  /// Catalog price captured when the order was validated.
  pub unit_price: Money,
  pub line_total: Money,
}

/// Order line joined with the book it refers to, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
  pub book_id: Uuid,
  pub title: String,
  pub author: String,
  pub cover_image: Option<String>,
  pub unit_price: Money,
  pub quantity: i32,
  pub line_total: Money,
}

/// Header + items + payment; what confirmation and detail screens render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItemView>,
  pub payment: Option<Payment>,
}

/// Listing row: header plus a few aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  #[serde(flatten)]
  pub order: Order,
  pub item_count: i64,
  pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub customer_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
  /// Inclusive, compared against the UTC creation date.
  pub from_date: Option<NaiveDate>,
  /// Inclusive, compared against the UTC creation date.
  pub to_date: Option<NaiveDate>,
  pub page: PageRequest,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    let created_on = order.created_at.date_naive();
    self.customer_id.map_or(true, |id| order.customer_id == id)
      && self.status.map_or(true, |status| order.status == status)
      && self.from_date.map_or(true, |from| created_on >= from)
      && self.to_date.map_or(true, |to| created_on <= to)
  }
}
