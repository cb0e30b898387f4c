// server/src/db/rows.rs

//! Row shapes returned by the queries in `pg_store`, and their conversion to
//! domain types. Enumerations are stored as their wire strings.

use bookstore_core::{
  Book, CartLine, Category, Customer, CustomerSummary, Employee, EmployeeSummary, Order, OrderItemView, OrderLine,
  OrderStatus, OrderSummary, Payment, PaymentMethod, PaymentStatus, StaffRole, StoreError,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

pub const BOOK_COLUMNS: &str =
  "id, title, author, genre, description, category_id, price, stock_quantity, cover_image, created_at";
pub const CART_COLUMNS: &str = "customer_id, book_id, quantity, line_total, updated_at";
pub const ORDER_COLUMNS: &str = "id, customer_id, handled_by, total, status, note, created_at";
pub const ORDER_LINE_COLUMNS: &str = "order_id, book_id, quantity, unit_price, line_total";
pub const PAYMENT_COLUMNS: &str = "id, order_id, method, amount, status, paid_at";
pub const CUSTOMER_COLUMNS: &str = "id, full_name, email, phone, address, active, registered_at";
pub const EMPLOYEE_COLUMNS: &str = "id, username, full_name, role, created_at";

fn decode<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
  value
    .parse::<T>()
    .map_err(|_| StoreError::Corrupt(format!("unexpected {} value '{}'", column, value)))
}

#[derive(Debug, FromRow)]
pub struct CategoryRow {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
}

impl From<CategoryRow> for Category {
  fn from(row: CategoryRow) -> Self {
    Category {
      id: row.id,
      name: row.name,
      description: row.description,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct BookRow {
  pub id: Uuid,
  pub title: String,
  pub author: String,
  pub genre: Option<String>,
  pub description: Option<String>,
  pub category_id: Option<Uuid>,
  pub price: i64,
  pub stock_quantity: i32,
  pub cover_image: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
  fn from(row: BookRow) -> Self {
    Book {
      id: row.id,
      title: row.title,
      author: row.author,
      genre: row.genre,
      description: row.description,
      category_id: row.category_id,
      price: row.price,
      stock_quantity: row.stock_quantity,
      cover_image: row.cover_image,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct CartLineRow {
  pub customer_id: Uuid,
  pub book_id: Uuid,
  pub quantity: i32,
  pub line_total: i64,
  pub updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
  fn from(row: CartLineRow) -> Self {
    CartLine {
      customer_id: row.customer_id,
      book_id: row.book_id,
      quantity: row.quantity,
      line_total: row.line_total,
      updated_at: row.updated_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub handled_by: Option<Uuid>,
  pub total: i64,
  pub status: String,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    Ok(Order {
      id: row.id,
      customer_id: row.customer_id,
      handled_by: row.handled_by,
      total: row.total,
      status: decode::<OrderStatus>("orders.status", &row.status)?,
      note: row.note,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct OrderSummaryRow {
  #[sqlx(flatten)]
  pub order: OrderRow,
  pub item_count: i64,
  pub payment_status: Option<String>,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
  type Error = StoreError;

  fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
    let payment_status = row
      .payment_status
      .as_deref()
      .map(|status| decode::<PaymentStatus>("payments.status", status))
      .transpose()?;
    Ok(OrderSummary {
      order: Order::try_from(row.order)?,
      item_count: row.item_count,
      payment_status,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct OrderLineRow {
  pub order_id: Uuid,
  pub book_id: Uuid,
  pub quantity: i32,
  pub unit_price: i64,
  pub line_total: i64,
}

impl From<OrderLineRow> for OrderLine {
  fn from(row: OrderLineRow) -> Self {
    OrderLine {
      order_id: row.order_id,
      book_id: row.book_id,
      quantity: row.quantity,
      unit_price: row.unit_price,
      line_total: row.line_total,
    }
  }
}

/// An order line joined with its book.
#[derive(Debug, FromRow)]
pub struct OrderItemRow {
  pub book_id: Uuid,
  pub title: String,
  pub author: String,
  pub cover_image: Option<String>,
  pub unit_price: i64,
  pub quantity: i32,
  pub line_total: i64,
}

impl From<OrderItemRow> for OrderItemView {
  fn from(row: OrderItemRow) -> Self {
    OrderItemView {
      book_id: row.book_id,
      title: row.title,
      author: row.author,
      cover_image: row.cover_image,
      unit_price: row.unit_price,
      quantity: row.quantity,
      line_total: row.line_total,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct PaymentRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub method: String,
  pub amount: i64,
  pub status: String,
  pub paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
  type Error = StoreError;

  fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
    Ok(Payment {
      id: row.id,
      order_id: row.order_id,
      method: decode::<PaymentMethod>("payments.method", &row.method)?,
      amount: row.amount,
      status: decode::<PaymentStatus>("payments.status", &row.status)?,
      paid_at: row.paid_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct CustomerRow {
  pub id: Uuid,
  pub full_name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub active: bool,
  pub registered_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
  fn from(row: CustomerRow) -> Self {
    Customer {
      id: row.id,
      full_name: row.full_name,
      email: row.email,
      phone: row.phone,
      address: row.address,
      active: row.active,
      registered_at: row.registered_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct CustomerSummaryRow {
  #[sqlx(flatten)]
  pub customer: CustomerRow,
  pub order_count: i64,
  pub total_spent: i64,
}

impl From<CustomerSummaryRow> for CustomerSummary {
  fn from(row: CustomerSummaryRow) -> Self {
    CustomerSummary {
      customer: row.customer.into(),
      order_count: row.order_count,
      total_spent: row.total_spent,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct EmployeeRow {
  pub id: Uuid,
  pub username: String,
  pub full_name: String,
  pub role: String,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
  type Error = StoreError;

  fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
    Ok(Employee {
      id: row.id,
      username: row.username,
      full_name: row.full_name,
      role: decode::<StaffRole>("employees.role", &row.role)?,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct EmployeeSummaryRow {
  #[sqlx(flatten)]
  pub employee: EmployeeRow,
  pub handled_orders: i64,
}

impl TryFrom<EmployeeSummaryRow> for EmployeeSummary {
  type Error = StoreError;

  fn try_from(row: EmployeeSummaryRow) -> Result<Self, Self::Error> {
    Ok(EmployeeSummary {
      employee: Employee::try_from(row.employee)?,
      handled_orders: row.handled_orders,
    })
  }
}
