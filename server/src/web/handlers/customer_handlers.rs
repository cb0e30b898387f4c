// server/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{customers, CustomerChanges, CustomerQuery, NewCustomer, PageRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Deserialize, Debug)]
pub struct ListCustomersQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub search: Option<String>,
  pub active: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct CustomerStatusPayload {
  pub active: bool,
}

#[instrument(name = "handler::list_customers", skip(app_state, actor))]
pub async fn list_customers_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListCustomersQuery>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let params = query_params.into_inner();
  let query = CustomerQuery {
    page: PageRequest::new(params.page, params.limit),
    search: params.search,
    active: params.active,
  };
  let page = customers::list_customers(app_state.store(), &actor.0, query).await?;
  info!("Listed {} of {} customer(s).", page.items.len(), page.pagination.total_items);

  Ok(HttpResponse::Ok().json(json!({
      "message": "Customers fetched successfully.",
      "customers": page.items,
      "pagination": page.pagination
  })))
}

#[instrument(name = "handler::get_customer", skip(app_state, path, actor), fields(customer_id = %path.as_ref()))]
pub async fn get_customer_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let customer = customers::get_customer(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Customer fetched successfully.",
      "customer": customer
  })))
}

#[instrument(name = "handler::create_customer", skip(app_state, payload, actor))]
pub async fn create_customer_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewCustomer>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let customer = customers::create_customer(app_state.store(), &actor.0, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
      "message": "Customer created successfully.",
      "customer": customer
  })))
}

#[instrument(name = "handler::update_customer", skip(app_state, path, payload, actor), fields(customer_id = %path.as_ref()))]
pub async fn update_customer_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CustomerChanges>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let customer =
    customers::update_customer(app_state.store(), &actor.0, path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Customer updated successfully.",
      "customer": customer
  })))
}

#[instrument(name = "handler::set_customer_status", skip(app_state, path, payload, actor), fields(customer_id = %path.as_ref()))]
pub async fn set_customer_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CustomerStatusPayload>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let customer =
    customers::set_customer_active(app_state.store(), &actor.0, path.into_inner(), payload.active).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Customer status updated successfully.",
      "customer": customer
  })))
}
