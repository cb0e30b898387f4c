// server/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{catalog, NewCategory};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = catalog::list_categories(app_state.store()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Categories fetched successfully.",
      "categories": categories
  })))
}

#[instrument(name = "handler::get_category", skip(app_state, path), fields(category_id = %path.as_ref()))]
pub async fn get_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let category = catalog::get_category(app_state.store(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Category fetched successfully.",
      "category": category
  })))
}

#[instrument(name = "handler::create_category", skip(app_state, payload, actor))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewCategory>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let category = catalog::create_category(app_state.store(), &actor.0, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
      "message": "Category created successfully.",
      "category": category
  })))
}

#[instrument(name = "handler::update_category", skip(app_state, path, payload, actor), fields(category_id = %path.as_ref()))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<NewCategory>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let category =
    catalog::update_category(app_state.store(), &actor.0, path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Category updated successfully.",
      "category": category
  })))
}

#[instrument(name = "handler::delete_category", skip(app_state, path, actor), fields(category_id = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  catalog::delete_category(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Category deleted successfully." })))
}
