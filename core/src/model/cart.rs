// core/src/model/cart.rs

use crate::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One book in a customer's cart. `(customer_id, book_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub customer_id: Uuid,
  pub book_id: Uuid,
  pub quantity: i32,
  /// quantity × unit price as of the last add/update; not refreshed on price changes.
  pub line_total: Money,
  pub updated_at: DateTime<Utc>,
}

impl CartLine {
  pub fn priced(customer_id: Uuid, book_id: Uuid, quantity: i32, unit_price: Money) -> Self {
    Self {
      customer_id,
      book_id,
      quantity,
      line_total: unit_price.saturating_mul(Money::from(quantity)),
      updated_at: Utc::now(),
    }
  }
}
