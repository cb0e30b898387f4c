// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::cart;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedCustomer;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub book_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartLinePayload {
  pub quantity: i32,
}

// --- Handler Implementation ---

#[instrument(name = "handler::view_cart", skip(app_state, customer), fields(customer_id = %customer.customer_id))]
pub async fn view_cart_handler(
  app_state: web::Data<AppState>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  let view = cart::view_cart(app_state.store(), customer.customer_id).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart fetched successfully.",
      "items": view.items,
      "summary": view.summary
  })))
}

#[instrument(name = "handler::cart_count", skip(app_state, customer), fields(customer_id = %customer.customer_id))]
pub async fn cart_count_handler(
  app_state: web::Data<AppState>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  let count = cart::cart_count(app_state.store(), customer.customer_id).await?;
  Ok(HttpResponse::Ok().json(count))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, customer),
    fields(customer_id = %customer.customer_id, book_id = %req_payload.book_id, quantity = %req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  info!(
    "Add to cart attempt by customer: {}, book: {}, quantity: {}",
    customer.customer_id, req_payload.book_id, req_payload.quantity
  );
  let line = cart::add_to_cart(
    app_state.store(),
    customer.customer_id,
    req_payload.book_id,
    req_payload.quantity,
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "Item added to cart successfully.",
      "cartItem": line
  })))
}

#[instrument(
    name = "handler::update_cart_line",
    skip(app_state, path, req_payload, customer),
    fields(customer_id = %customer.customer_id, book_id = %path.as_ref(), quantity = %req_payload.quantity)
)]
pub async fn update_cart_line_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateCartLinePayload>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  let line = cart::update_cart_line(
    app_state.store(),
    customer.customer_id,
    path.into_inner(),
    req_payload.quantity,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart item updated successfully.",
      "cartItem": line
  })))
}

#[instrument(
    name = "handler::remove_from_cart",
    skip(app_state, path, customer),
    fields(customer_id = %customer.customer_id, book_id = %path.as_ref())
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  cart::remove_from_cart(app_state.store(), customer.customer_id, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Item removed from cart." })))
}

#[instrument(name = "handler::clear_cart", skip(app_state, customer), fields(customer_id = %customer.customer_id))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  let removed = cart::clear_cart(app_state.store(), customer.customer_id).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart cleared.",
      "removed": removed
  })))
}
