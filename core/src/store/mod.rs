// core/src/store/mod.rs

//! The data-access seam.
//!
//! Operations receive a `&dyn BookstoreStore` instead of reaching for a global
//! pool, so the same checkout code runs against PostgreSQL in production and
//! against [`memory::InMemoryStore`] in tests.
//!
//! Plain reads and single-row writes go through [`BookstoreStore`]. Anything
//! that must be atomic runs on a [`StoreTx`] obtained from
//! [`BookstoreStore::begin`]; dropping a transaction without committing it
//! discards every write made through it.

pub mod memory;

use crate::error::StoreResult;
use crate::model::{
  Book, BookChanges, BookQuery, CartLine, Category, Customer, CustomerChanges, CustomerQuery, CustomerSummary,
  Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewBook, NewCategory, Order, OrderDetail, OrderFilter,
  OrderLine, OrderStatus, OrderSummary, Payment,
};
use crate::pagination::Page;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdate {
  /// Stock was reduced; carries the quantity left.
  Decremented { remaining: i32 },
  /// The row held less than requested (or vanished); nothing was written.
  Insufficient,
}

#[async_trait]
pub trait BookstoreStore: Send + Sync {
  // --- Catalog ---
  async fn list_categories(&self) -> StoreResult<Vec<Category>>;
  async fn get_category(&self, category_id: Uuid) -> StoreResult<Option<Category>>;
  async fn insert_category(&self, new_category: NewCategory) -> StoreResult<Category>;
  async fn update_category(&self, category_id: Uuid, changes: NewCategory) -> StoreResult<Option<Category>>;

  async fn list_books(&self, query: &BookQuery) -> StoreResult<Page<Book>>;
  async fn get_book(&self, book_id: Uuid) -> StoreResult<Option<Book>>;
  /// Books for the given ids; unknown ids are skipped.
  async fn get_books(&self, book_ids: &[Uuid]) -> StoreResult<Vec<Book>>;
  async fn insert_book(&self, new_book: NewBook) -> StoreResult<Book>;
  async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> StoreResult<Option<Book>>;

  // --- Carts ---
  async fn cart_lines(&self, customer_id: Uuid) -> StoreResult<Vec<CartLine>>;
  async fn cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<Option<CartLine>>;
  /// Inserts or replaces the `(customer_id, book_id)` line.
  async fn upsert_cart_line(&self, line: CartLine) -> StoreResult<CartLine>;
  async fn delete_cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<bool>;
  async fn clear_cart(&self, customer_id: Uuid) -> StoreResult<u64>;

  // --- Orders ---
  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Page<OrderSummary>>;
  async fn order_detail(&self, order_id: Uuid) -> StoreResult<Option<OrderDetail>>;
  async fn get_payment(&self, order_id: Uuid) -> StoreResult<Option<Payment>>;

  // --- Customers ---
  async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<Page<CustomerSummary>>;
  async fn get_customer(&self, customer_id: Uuid) -> StoreResult<Option<Customer>>;
  /// Case-insensitive lookup.
  async fn customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;
  async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer>;
  async fn update_customer(&self, customer_id: Uuid, changes: CustomerChanges) -> StoreResult<Option<Customer>>;
  async fn set_customer_active(&self, customer_id: Uuid, active: bool) -> StoreResult<Option<Customer>>;

  // --- Employees ---
  async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Page<EmployeeSummary>>;
  async fn get_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>>;
  /// Case-insensitive lookup.
  async fn employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>>;
  async fn insert_employee(&self, employee: Employee) -> StoreResult<Employee>;
  async fn update_employee(&self, employee_id: Uuid, changes: EmployeeChanges) -> StoreResult<Option<Employee>>;
  async fn delete_employee(&self, employee_id: Uuid) -> StoreResult<bool>;
  async fn employee_has_orders(&self, employee_id: Uuid) -> StoreResult<bool>;

  /// Opens a transaction.
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// Writes that must commit or vanish together.
///
/// `lock_*` methods read a row and hold it against concurrent transactions
/// until commit or rollback.
#[async_trait]
pub trait StoreTx: Send {
  async fn lock_book(&mut self, book_id: Uuid) -> StoreResult<Option<Book>>;
  /// Decrements only if at least `quantity` units remain.
  async fn decrement_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<StockUpdate>;
  async fn increment_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<()>;

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;
  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()>;
  async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()>;

  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>>;
  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>>;
  async fn set_order_status(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    handled_by: Option<Uuid>,
  ) -> StoreResult<()>;

  async fn lock_payment(&mut self, order_id: Uuid) -> StoreResult<Option<Payment>>;
  async fn update_payment(&mut self, payment: &Payment) -> StoreResult<()>;

  /// The customer's cart, held until the transaction ends.
  async fn lock_cart_lines(&mut self, customer_id: Uuid) -> StoreResult<Vec<CartLine>>;
  async fn remove_cart_lines(&mut self, customer_id: Uuid, book_ids: &[Uuid]) -> StoreResult<u64>;

  async fn book_has_order_lines(&mut self, book_id: Uuid) -> StoreResult<bool>;
  /// Returns false when no such book existed. Cart lines for it go with it.
  async fn delete_book(&mut self, book_id: Uuid) -> StoreResult<bool>;

  async fn lock_category(&mut self, category_id: Uuid) -> StoreResult<Option<Category>>;
  async fn category_has_books(&mut self, category_id: Uuid) -> StoreResult<bool>;
  async fn delete_category(&mut self, category_id: Uuid) -> StoreResult<bool>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;
  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
