// server/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{payments, PaymentStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Deserialize, Debug)]
pub struct UpdatePaymentStatusPayload {
  pub status: PaymentStatus,
}

#[instrument(name = "handler::get_payment", skip(app_state, path, actor), fields(order_id = %path.as_ref()))]
pub async fn get_payment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let payment = payments::get_payment(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Payment fetched successfully.",
      "payment": payment
  })))
}

#[instrument(
    name = "handler::update_payment_status",
    skip(app_state, path, payload, actor),
    fields(order_id = %path.as_ref(), status = %payload.status)
)]
pub async fn update_payment_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdatePaymentStatusPayload>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let payment = payments::update_payment_status(app_state.store(), &actor.0, order_id, payload.status).await?;
  info!("Payment of order {} set to {}.", order_id, payment.status);
  Ok(HttpResponse::Ok().json(json!({
      "message": "Payment status updated.",
      "payment": payment
  })))
}
