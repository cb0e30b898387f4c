// core/src/error.rs
use crate::model::OrderStatus;
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a storage backend.
///
/// These never reach HTTP clients verbatim; the domain layer folds them into
/// [`BookstoreError::TransactionFailure`].
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Storage backend error: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },

  #[error("Stored value could not be decoded: {0}")]
  Corrupt(String),
}

impl StoreError {
  /// Wraps any driver error (sqlx, io, ...) as an opaque backend failure.
  pub fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    StoreError::Backend {
      source: AnyhowError::new(err),
    }
  }
}

#[derive(Debug, Error)]
pub enum BookstoreError {
  #[error("Invalid order: {0}")]
  InvalidOrder(String),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Book {book_id} does not exist")]
  BookNotFound { book_id: Uuid },

  #[error("Category {category_id} does not exist")]
  CategoryNotFound { category_id: Uuid },

  #[error("Order {order_id} does not exist")]
  OrderNotFound { order_id: Uuid },

  #[error("No payment is recorded for order {order_id}")]
  PaymentNotFound { order_id: Uuid },

  #[error("Book {book_id} is not in the cart")]
  CartLineNotFound { book_id: Uuid },

  #[error("Customer {customer_id} does not exist")]
  CustomerNotFound { customer_id: Uuid },

  #[error("Employee {employee_id} does not exist")]
  EmployeeNotFound { employee_id: Uuid },

  #[error("\"{title}\" has only {available} unit(s) in stock ({requested} requested)")]
  InsufficientStock {
    book_id: Uuid,
    title: String,
    available: i32,
    requested: i32,
  },

  #[error("Order {order_id} cannot move from {from} to {to}")]
  InvalidStatusTransition {
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
  },

  #[error("Book {book_id} is referenced by existing orders")]
  BookInUse { book_id: Uuid },

  #[error("Category {category_id} still has books")]
  CategoryInUse { category_id: Uuid },

  #[error("Employee {employee_id} has handled orders")]
  EmployeeInUse { employee_id: Uuid },

  /// A unique field (category name, customer email, employee username) is taken.
  #[error("{0} is already in use")]
  AlreadyExists(String),

  #[error("Order {order_id} is cancelled; its payment can no longer change")]
  OrderCancelled { order_id: Uuid },

  #[error("Customer account {customer_id} is deactivated")]
  CustomerInactive { customer_id: Uuid },

  #[error("Not permitted: {0}")]
  Forbidden(String),

  #[error("The operation could not be completed")]
  TransactionFailure {
    #[from]
    source: StoreError,
  },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type Result<T, E = BookstoreError> = std::result::Result<T, E>;
