// core/src/orders.rs

use crate::access::Actor;
use crate::error::{BookstoreError, Result};
use crate::model::{OrderDetail, OrderFilter, OrderStatus, OrderSummary};
use crate::pagination::Page;
use crate::store::{BookstoreStore, StoreTx};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct StatusChange {
  pub order_id: Uuid,
  pub target: OrderStatus,
  pub actor: Actor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeOutcome {
  pub order: OrderDetail,
  /// False when the order already had the requested status.
  pub applied: bool,
}

/// Customers may only withdraw their own orders, and only before staff
/// confirmed them.
fn check_customer_transition(customer_id: Uuid, owner: Uuid, from: OrderStatus, to: OrderStatus) -> Result<()> {
  if customer_id != owner {
    return Err(BookstoreError::Forbidden(
      "Customers can only access their own orders".to_string(),
    ));
  }
  if to != OrderStatus::Cancelled || from != OrderStatus::PendingConfirmation {
    return Err(BookstoreError::Forbidden(
      "Customers can only cancel orders that are still awaiting confirmation".to_string(),
    ));
  }
  Ok(())
}

/// Applies the transition inside `tx`. Returns whether anything was written.
async fn apply_transition(tx: &mut dyn StoreTx, change: &StatusChange) -> Result<bool> {
  let order = tx
    .lock_order(change.order_id)
    .await?
    .ok_or(BookstoreError::OrderNotFound {
      order_id: change.order_id,
    })?;

  if let Actor::Customer { customer_id } = change.actor {
    if order.customer_id != customer_id {
      return Err(BookstoreError::Forbidden(
        "Customers can only access their own orders".to_string(),
      ));
    }
  }

  if order.status == change.target {
    info!("Order {} is already {}; nothing to do.", order.id, order.status);
    return Ok(false);
  }
  if order.status.is_terminal() {
    return Err(BookstoreError::InvalidStatusTransition {
      order_id: order.id,
      from: order.status,
      to: change.target,
    });
  }
  if let Actor::Customer { customer_id } = change.actor {
    check_customer_transition(customer_id, order.customer_id, order.status, change.target)?;
  }

  tx.set_order_status(order.id, change.target, change.actor.employee_id())
    .await?;
  info!("Order {}: {} -> {}.", order.id, order.status, change.target);

  if change.target == OrderStatus::Cancelled {
    let lines = tx.order_lines(order.id).await?;
    for line in &lines {
      tx.increment_stock(line.book_id, line.quantity).await?;
    }
    info!("Order {}: restored stock for {} line(s).", order.id, lines.len());
  }
  Ok(true)
}

/// Moves an order to `change.target`, restoring stock when it is cancelled.
///
/// The order row stays locked from the status check to commit, so two racing
/// cancellations restore stock once: the second one sees `Huy` and is a no-op.
#[instrument(
  name = "orders::update_order_status",
  skip(store, change),
  fields(order_id = %change.order_id, target = %change.target)
)]
pub async fn update_order_status(store: &dyn BookstoreStore, change: StatusChange) -> Result<StatusChangeOutcome> {
  let mut tx = store.begin().await?;
  let applied = match apply_transition(tx.as_mut(), &change).await {
    Ok(applied) => applied,
    Err(err) => {
      warn!("Status change for order {} rejected: {}", change.order_id, err);
      if let Err(rollback_err) = tx.rollback().await {
        error!("Status change rollback failed: {}", rollback_err);
      }
      return Err(err);
    }
  };
  tx.commit().await?;

  let order = store
    .order_detail(change.order_id)
    .await?
    .ok_or(BookstoreError::OrderNotFound {
      order_id: change.order_id,
    })?;
  Ok(StatusChangeOutcome { order, applied })
}

#[instrument(name = "orders::list_orders", skip(store, actor))]
pub async fn list_orders(store: &dyn BookstoreStore, actor: &Actor, filter: OrderFilter) -> Result<Page<OrderSummary>> {
  let filter = match actor {
    Actor::Staff { .. } => filter,
    Actor::Customer { customer_id } => OrderFilter {
      customer_id: Some(*customer_id),
      ..filter
    },
  };
  Ok(store.list_orders(&filter).await?)
}

#[instrument(name = "orders::get_order", skip(store, viewer), fields(order_id = %order_id))]
pub async fn get_order(store: &dyn BookstoreStore, viewer: &Actor, order_id: Uuid) -> Result<OrderDetail> {
  let detail = store
    .order_detail(order_id)
    .await?
    .ok_or(BookstoreError::OrderNotFound { order_id })?;
  viewer.ensure_can_view_order_of(detail.order.customer_id)?;
  Ok(detail)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn customers_may_only_cancel_pending_orders() {
    let me = Uuid::new_v4();
    assert!(check_customer_transition(me, me, OrderStatus::PendingConfirmation, OrderStatus::Cancelled).is_ok());
    assert!(matches!(
      check_customer_transition(me, me, OrderStatus::Processing, OrderStatus::Cancelled),
      Err(BookstoreError::Forbidden(_))
    ));
    assert!(matches!(
      check_customer_transition(me, me, OrderStatus::PendingConfirmation, OrderStatus::Processing),
      Err(BookstoreError::Forbidden(_))
    ));
    assert!(matches!(
      check_customer_transition(me, Uuid::new_v4(), OrderStatus::PendingConfirmation, OrderStatus::Cancelled),
      Err(BookstoreError::Forbidden(_))
    ));
  }
}
