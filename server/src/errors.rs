// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bookstore_core::BookstoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  /// Anything the domain layer rejected or failed to do.
  #[error(transparent)]
  Domain(#[from] BookstoreError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

/// Machine-readable code sent alongside the message.
fn domain_code(err: &BookstoreError) -> &'static str {
  match err {
    BookstoreError::InvalidOrder(_) => "InvalidOrder",
    BookstoreError::Validation(_) => "Validation",
    BookstoreError::BookNotFound { .. } => "BookNotFound",
    BookstoreError::CategoryNotFound { .. } => "CategoryNotFound",
    BookstoreError::OrderNotFound { .. } => "OrderNotFound",
    BookstoreError::PaymentNotFound { .. } => "PaymentNotFound",
    BookstoreError::CartLineNotFound { .. } => "CartLineNotFound",
    BookstoreError::CustomerNotFound { .. } => "CustomerNotFound",
    BookstoreError::EmployeeNotFound { .. } => "EmployeeNotFound",
    BookstoreError::InsufficientStock { .. } => "InsufficientStock",
    BookstoreError::InvalidStatusTransition { .. } => "InvalidStatusTransition",
    BookstoreError::BookInUse { .. } => "BookInUse",
    BookstoreError::CategoryInUse { .. } => "CategoryInUse",
    BookstoreError::EmployeeInUse { .. } => "EmployeeInUse",
    BookstoreError::AlreadyExists(_) => "AlreadyExists",
    BookstoreError::OrderCancelled { .. } => "OrderCancelled",
    BookstoreError::CustomerInactive { .. } => "CustomerInactive",
    BookstoreError::Forbidden(_) => "Forbidden",
    BookstoreError::TransactionFailure { .. } => "TransactionFailure",
  }
}

fn domain_status(err: &BookstoreError) -> StatusCode {
  match err {
    BookstoreError::InvalidOrder(_) | BookstoreError::Validation(_) => StatusCode::BAD_REQUEST,
    BookstoreError::Forbidden(_) | BookstoreError::CustomerInactive { .. } => StatusCode::FORBIDDEN,
    BookstoreError::BookNotFound { .. }
    | BookstoreError::CategoryNotFound { .. }
    | BookstoreError::OrderNotFound { .. }
    | BookstoreError::PaymentNotFound { .. }
    | BookstoreError::CartLineNotFound { .. }
    | BookstoreError::CustomerNotFound { .. }
    | BookstoreError::EmployeeNotFound { .. } => StatusCode::NOT_FOUND,
    BookstoreError::InsufficientStock { .. }
    | BookstoreError::InvalidStatusTransition { .. }
    | BookstoreError::BookInUse { .. }
    | BookstoreError::CategoryInUse { .. }
    | BookstoreError::EmployeeInUse { .. }
    | BookstoreError::AlreadyExists(_)
    | BookstoreError::OrderCancelled { .. } => StatusCode::CONFLICT,
    BookstoreError::TransactionFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Domain(err) => domain_status(err),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    let status = self.status_code();
    match self {
      AppError::Validation(m) => HttpResponse::build(status).json(json!({"error": m, "code": "Validation"})),
      AppError::Auth(m) => HttpResponse::build(status).json(json!({"error": m, "code": "Unauthorized"})),
      AppError::Forbidden(m) => HttpResponse::build(status).json(json!({"error": m, "code": "Forbidden"})),
      AppError::Config(m) => {
        HttpResponse::build(status).json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::build(status).json(json!({"error": "Database operation failed"})),
      AppError::Domain(err) => {
        let code = domain_code(err);
        match err {
          BookstoreError::InsufficientStock {
            book_id,
            available,
            requested,
            ..
          } => HttpResponse::build(status).json(json!({
              "error": err.to_string(),
              "code": code,
              "bookId": book_id,
              "available": available,
              "requested": requested
          })),
          BookstoreError::TransactionFailure { source } => {
            tracing::error!(store_error = ?source, "Store failure details");
            HttpResponse::build(status).json(json!({"error": err.to_string(), "code": code}))
          }
          _ => HttpResponse::build(status).json(json!({"error": err.to_string(), "code": code})),
        }
      }
      AppError::Internal(_) => HttpResponse::build(status).json(json!({"error": "An internal error occurred"})),
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use bookstore_core::StoreError;
  use uuid::Uuid;

  #[test]
  fn domain_errors_map_to_http_statuses() {
    let cases = [
      (BookstoreError::InvalidOrder("empty".into()), StatusCode::BAD_REQUEST),
      (BookstoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
      (BookstoreError::BookNotFound { book_id: Uuid::nil() }, StatusCode::NOT_FOUND),
      (BookstoreError::BookInUse { book_id: Uuid::nil() }, StatusCode::CONFLICT),
      (BookstoreError::CustomerNotFound { customer_id: Uuid::nil() }, StatusCode::NOT_FOUND),
      (BookstoreError::CategoryInUse { category_id: Uuid::nil() }, StatusCode::CONFLICT),
      (BookstoreError::AlreadyExists("Email 'a@b.vn'".into()), StatusCode::CONFLICT),
      (BookstoreError::OrderCancelled { order_id: Uuid::nil() }, StatusCode::CONFLICT),
      (BookstoreError::CustomerInactive { customer_id: Uuid::nil() }, StatusCode::FORBIDDEN),
      (
        BookstoreError::InsufficientStock {
          book_id: Uuid::nil(),
          title: "A".into(),
          available: 0,
          requested: 1,
        },
        StatusCode::CONFLICT,
      ),
      (
        BookstoreError::from(StoreError::Corrupt("bad status".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, expected) in cases {
      assert_eq!(AppError::from(err).status_code(), expected);
    }
  }
}
