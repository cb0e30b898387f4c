// server/src/web/handlers/book_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{catalog, BookChanges, BookQuery, NewBook, PageRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Deserialize, Debug)]
pub struct ListBooksQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub search: Option<String>,
  pub category: Option<Uuid>,
}

#[instrument(name = "handler::list_books", skip(app_state))]
pub async fn list_books_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListBooksQuery>,
) -> Result<HttpResponse, AppError> {
  let params = query_params.into_inner();
  let query = BookQuery {
    page: PageRequest::new(params.page, params.limit),
    search: params.search,
    category_id: params.category,
  };
  let page = catalog::list_books(app_state.store(), query).await?;
  info!("Listed {} of {} book(s).", page.items.len(), page.pagination.total_items);

  Ok(HttpResponse::Ok().json(json!({
      "message": "Books fetched successfully.",
      "books": page.items,
      "pagination": page.pagination
  })))
}

#[instrument(name = "handler::get_book", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn get_book_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let book = catalog::get_book(app_state.store(), path.into_inner()).await?;
  let stock_level = book.stock_level();
  Ok(HttpResponse::Ok().json(json!({
      "message": "Book fetched successfully.",
      "book": book,
      "stockLevel": stock_level
  })))
}

#[instrument(name = "handler::create_book", skip(app_state, payload, actor))]
pub async fn create_book_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewBook>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let book = catalog::create_book(app_state.store(), &actor.0, payload.into_inner()).await?;
  info!("Book {} created.", book.id);
  Ok(HttpResponse::Created().json(json!({
      "message": "Book created successfully.",
      "book": book
  })))
}

#[instrument(name = "handler::update_book", skip(app_state, path, payload, actor), fields(book_id = %path.as_ref()))]
pub async fn update_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<BookChanges>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let book = catalog::update_book(app_state.store(), &actor.0, path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Book updated successfully.",
      "book": book
  })))
}

#[instrument(name = "handler::delete_book", skip(app_state, path, actor), fields(book_id = %path.as_ref()))]
pub async fn delete_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  catalog::delete_book(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Book deleted successfully." })))
}
