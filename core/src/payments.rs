// core/src/payments.rs

use crate::access::Actor;
use crate::error::{BookstoreError, Result};
use crate::model::{OrderStatus, Payment, PaymentStatus};
use crate::store::{BookstoreStore, StoreTx};
use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[instrument(name = "payments::get_payment", skip(store, viewer))]
pub async fn get_payment(store: &dyn BookstoreStore, viewer: &Actor, order_id: Uuid) -> Result<Payment> {
  let detail = store
    .order_detail(order_id)
    .await?
    .ok_or(BookstoreError::OrderNotFound { order_id })?;
  viewer.ensure_can_view_order_of(detail.order.customer_id)?;
  detail.payment.ok_or(BookstoreError::PaymentNotFound { order_id })
}

async fn apply_payment_status(
  tx: &mut dyn StoreTx,
  order_id: Uuid,
  status: PaymentStatus,
  employee_id: Option<Uuid>,
) -> Result<Payment> {
  let order = tx
    .lock_order(order_id)
    .await?
    .ok_or(BookstoreError::OrderNotFound { order_id })?;
  let mut payment = tx
    .lock_payment(order_id)
    .await?
    .ok_or(BookstoreError::PaymentNotFound { order_id })?;

  // Cancelling already returned the stock; the payment stays as it was.
  if order.status == OrderStatus::Cancelled && payment.status != status {
    warn!(
      "Payment for cancelled order {} cannot move from {} to {}.",
      order_id, payment.status, status
    );
    return Err(BookstoreError::OrderCancelled { order_id });
  }

  payment.set_status(status, Utc::now());
  tx.update_payment(&payment).await?;
  info!("Payment for order {} is now {}.", order_id, payment.status);

  // A confirmed payment confirms the order too.
  if status == PaymentStatus::Success && order.status == OrderStatus::PendingConfirmation {
    tx.set_order_status(order_id, OrderStatus::Processing, employee_id).await?;
    info!("Order {} advanced to {} after payment.", order_id, OrderStatus::Processing);
  }
  Ok(payment)
}

/// Records the outcome of a payment. Staff only.
#[instrument(name = "payments::update_payment_status", skip(store, actor), fields(status = %status))]
pub async fn update_payment_status(
  store: &dyn BookstoreStore,
  actor: &Actor,
  order_id: Uuid,
  status: PaymentStatus,
) -> Result<Payment> {
  actor.ensure_staff()?;
  let mut tx = store.begin().await?;
  match apply_payment_status(tx.as_mut(), order_id, status, actor.employee_id()).await {
    Ok(payment) => {
      tx.commit().await?;
      Ok(payment)
    }
    Err(err) => {
      warn!("Payment update for order {} rejected: {}", order_id, err);
      if let Err(rollback_err) = tx.rollback().await {
        error!("Payment update rollback failed: {}", rollback_err);
      }
      Err(err)
    }
  }
}
