// core/src/model/mod.rs

//! Contains the data structures the bookstore works with.
//! Storage backends map their rows onto these types; the HTTP layer serializes
//! them as camelCase JSON.

pub mod book;
pub mod cart;
pub mod customer;
pub mod employee;
pub mod order;
pub mod payment;

pub use book::{Book, BookChanges, BookQuery, Category, NewBook, NewCategory, StockLevel};
pub use cart::CartLine;
pub use customer::{Customer, CustomerChanges, CustomerQuery, CustomerSummary, NewCustomer};
pub use employee::{Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewEmployee};
pub use order::{Order, OrderDetail, OrderFilter, OrderItemView, OrderLine, OrderStatus, OrderSummary};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
