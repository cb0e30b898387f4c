// core/src/lib.rs

//! bookstore-core: the domain layer of the bookstore service.
//!
//! This crate owns everything that has to stay consistent regardless of how
//! the service is exposed or where its data lives:
//!  - The domain model (books, categories, cart lines, orders, payments).
//!  - The storage seam ([`BookstoreStore`] / [`StoreTx`]) and an in-memory
//!    implementation used by tests and local tooling.
//!  - Order placement: validating items against live stock and persisting the
//!    order, its lines, its payment stub and the stock decrement atomically.
//!  - Order status transitions, including stock restoration on cancellation.
//!  - Advisory cart bookkeeping, catalog maintenance and payment updates.
//!  - Customer profiles and staff records.
//!
//! HTTP and PostgreSQL live in the `bookstore_server` crate.

pub mod access;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod employees;
pub mod error;
pub mod model;
pub mod orders;
pub mod pagination;
pub mod payments;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::access::{Actor, StaffRole};
pub use crate::cart::{CartCount, CartItemView, CartSummary, CartView};
pub use crate::checkout::{checkout_cart, place_order, CartCheckout, OrderItemRequest, OrderSource, PlaceOrder};
pub use crate::error::{BookstoreError, Result, StoreError, StoreResult};
pub use crate::model::{
  Book, BookChanges, BookQuery, CartLine, Category, Customer, CustomerChanges, CustomerQuery, CustomerSummary,
  Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewBook, NewCategory, NewCustomer, NewEmployee, Order,
  OrderDetail, OrderFilter, OrderItemView, OrderLine, OrderStatus, OrderSummary, Payment, PaymentMethod,
  PaymentStatus, StockLevel,
};
pub use crate::orders::{update_order_status, StatusChange, StatusChangeOutcome};
pub use crate::pagination::{Page, PageRequest, Pagination};
pub use crate::store::memory::InMemoryStore;
pub use crate::store::{BookstoreStore, StockUpdate, StoreTx};

/// Money amounts are whole Vietnamese đồng.
pub type Money = i64;
