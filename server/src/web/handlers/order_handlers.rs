// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{
  checkout_cart, orders, place_order, update_order_status, Actor, CartCheckout, OrderFilter, OrderItemRequest,
  OrderSource, OrderStatus, PageRequest, PaymentMethod, PlaceOrder, StatusChange,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedActor, AuthenticatedCustomer};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
  /// Required when staff order on a customer's behalf; ignored for customers.
  pub customer_id: Option<Uuid>,
  pub items: Vec<OrderItemRequest>,
  pub note: Option<String>,
  #[serde(default)]
  pub payment_method: PaymentMethod,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub customer_id: Option<Uuid>,
  pub note: Option<String>,
  #[serde(default)]
  pub payment_method: PaymentMethod,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<OrderStatus>,
  pub customer_id: Option<Uuid>,
  pub from_date: Option<NaiveDate>,
  pub to_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateOrderStatusPayload {
  pub status: OrderStatus,
}

/// Whose order this is, and which employee (if any) is placing it.
fn resolve_customer(actor: &Actor, requested: Option<Uuid>) -> Result<(Uuid, Option<Uuid>), AppError> {
  match actor {
    Actor::Customer { customer_id } => Ok((*customer_id, None)),
    Actor::Staff { employee_id, .. } => requested
      .map(|customer_id| (customer_id, Some(*employee_id)))
      .ok_or_else(|| AppError::Validation("customerId is required when staff place an order".to_string())),
  }
}

// --- Handler Implementation ---

#[instrument(name = "handler::place_order", skip(app_state, payload, actor), fields(lines = payload.items.len()))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PlaceOrderPayload>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let (customer_id, handled_by) = resolve_customer(&actor.0, payload.customer_id)?;

  let detail = place_order(
    app_state.store(),
    PlaceOrder {
      customer_id,
      items: payload.items,
      note: payload.note,
      payment_method: payload.payment_method,
      handled_by,
      source: OrderSource::Direct,
    },
  )
  .await?;
  info!("Order {} placed for customer {}.", detail.order.id, customer_id);

  Ok(HttpResponse::Created().json(json!({
      "message": "Order placed successfully.",
      "order": detail
  })))
}

/// An empty body means "all defaults"; anything else must be a valid payload.
fn parse_checkout_body(body: &[u8]) -> Result<CheckoutPayload, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(CheckoutPayload::default());
  }
  serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid checkout payload: {}", e)))
}

#[instrument(name = "handler::checkout_cart", skip(app_state, body, actor))]
pub async fn checkout_cart_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let payload = parse_checkout_body(&body)?;
  let (customer_id, handled_by) = resolve_customer(&actor.0, payload.customer_id)?;

  let detail = checkout_cart(
    app_state.store(),
    CartCheckout {
      customer_id,
      note: payload.note,
      payment_method: payload.payment_method,
      handled_by,
    },
  )
  .await?;
  info!("Cart of customer {} checked out as order {}.", customer_id, detail.order.id);

  Ok(HttpResponse::Created().json(json!({
      "message": "Order placed successfully.",
      "order": detail
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, actor))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListOrdersQuery>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  actor.0.ensure_staff()?;
  let params = query_params.into_inner();
  let filter = OrderFilter {
    customer_id: params.customer_id,
    status: params.status,
    from_date: params.from_date,
    to_date: params.to_date,
    page: PageRequest::new(params.page, params.limit),
  };
  let page = orders::list_orders(app_state.store(), &actor.0, filter).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Orders fetched successfully.",
      "orders": page.items,
      "pagination": page.pagination
  })))
}

#[instrument(name = "handler::my_orders", skip(app_state, customer), fields(customer_id = %customer.customer_id))]
pub async fn my_orders_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListOrdersQuery>,
  customer: AuthenticatedCustomer,
) -> Result<HttpResponse, AppError> {
  let params = query_params.into_inner();
  let filter = OrderFilter {
    status: params.status,
    from_date: params.from_date,
    to_date: params.to_date,
    page: PageRequest::new(params.page, params.limit),
    ..Default::default()
  };
  let actor = Actor::Customer {
    customer_id: customer.customer_id,
  };
  let page = orders::list_orders(app_state.store(), &actor, filter).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Orders fetched successfully.",
      "orders": page.items,
      "pagination": page.pagination
  })))
}

#[instrument(name = "handler::get_order", skip(app_state, path, actor), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let detail = orders::get_order(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Order fetched successfully.",
      "order": detail
  })))
}

#[instrument(
    name = "handler::update_order_status",
    skip(app_state, path, payload, actor),
    fields(order_id = %path.as_ref(), target = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateOrderStatusPayload>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let outcome = update_order_status(
    app_state.store(),
    StatusChange {
      order_id: path.into_inner(),
      target: payload.status,
      actor: actor.0,
    },
  )
  .await?;

  let message = if outcome.applied {
    "Order status updated."
  } else {
    "Order already has the requested status."
  };
  Ok(HttpResponse::Ok().json(json!({
      "message": message,
      "applied": outcome.applied,
      "order": outcome.order
  })))
}

#[cfg(test)]
mod tests {
  use super::*;
  use bookstore_core::StaffRole;

  #[test]
  fn staff_must_name_the_customer() {
    let staff = Actor::Staff {
      employee_id: Uuid::new_v4(),
      role: StaffRole::Clerk,
    };
    assert!(matches!(resolve_customer(&staff, None), Err(AppError::Validation(_))));

    let customer_id = Uuid::new_v4();
    let (resolved, handled_by) = resolve_customer(&staff, Some(customer_id)).unwrap();
    assert_eq!(resolved, customer_id);
    assert_eq!(handled_by, staff.employee_id());
  }

  #[test]
  fn customers_always_order_for_themselves() {
    let me = Uuid::new_v4();
    let actor = Actor::Customer { customer_id: me };
    assert_eq!(resolve_customer(&actor, Some(Uuid::new_v4())).unwrap(), (me, None));
  }

  #[test]
  fn checkout_body_is_optional_but_never_ignored() {
    assert_eq!(parse_checkout_body(b"").unwrap().payment_method, PaymentMethod::default());
    assert_eq!(parse_checkout_body(b" \n").unwrap().payment_method, PaymentMethod::default());
    assert!(matches!(
      parse_checkout_body(br#"{"paymentMethod":"Paypal"}"#),
      Err(AppError::Validation(_))
    ));
    assert!(matches!(parse_checkout_body(b"{not json"), Err(AppError::Validation(_))));
  }
}
