// server/src/db/pg_store.rs

//! PostgreSQL implementation of the store seam.
//!
//! Stock is reserved with `SELECT ... FOR UPDATE` followed by a conditional
//! `UPDATE ... WHERE stock_quantity >= $n`, so concurrent checkouts of the
//! same book queue on the row lock and can never drive stock below zero.

use crate::db::rows::{
  BookRow, CartLineRow, CategoryRow, CustomerRow, CustomerSummaryRow, EmployeeRow, EmployeeSummaryRow, OrderItemRow,
  OrderLineRow, OrderRow, OrderSummaryRow, PaymentRow, BOOK_COLUMNS, CART_COLUMNS, CUSTOMER_COLUMNS, EMPLOYEE_COLUMNS,
  ORDER_COLUMNS, ORDER_LINE_COLUMNS, PAYMENT_COLUMNS,
};
use async_trait::async_trait;
use bookstore_core::{
  Book, BookChanges, BookQuery, BookstoreStore, CartLine, Category, Customer, CustomerChanges, CustomerQuery,
  CustomerSummary, Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewBook, NewCategory, Order, OrderDetail,
  OrderFilter, OrderLine, OrderStatus, OrderSummary, Page, Payment, StockUpdate, StoreError, StoreResult, StoreTx,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, error};
use uuid::Uuid;

fn db_err(err: sqlx::Error) -> StoreError {
  error!("Database error: {}", err);
  StoreError::backend(err)
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for ch in term.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

fn push_book_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
  qb.push(" WHERE TRUE");
  if let Some(category_id) = query.category_id {
    qb.push(" AND category_id = ").push_bind(category_id);
  }
  if let Some(term) = query.search_term() {
    let pattern = like_pattern(term);
    qb.push(" AND (title ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR author ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
  qb.push(" WHERE TRUE");
  if let Some(customer_id) = filter.customer_id {
    qb.push(" AND o.customer_id = ").push_bind(customer_id);
  }
  if let Some(status) = filter.status {
    qb.push(" AND o.status = ").push_bind(status.as_str());
  }
  if let Some(from) = filter.from_date {
    qb.push(" AND (o.created_at AT TIME ZONE 'UTC')::date >= ").push_bind(from);
  }
  if let Some(to) = filter.to_date {
    qb.push(" AND (o.created_at AT TIME ZONE 'UTC')::date <= ").push_bind(to);
  }
}

fn push_customer_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CustomerQuery) {
  qb.push(" WHERE TRUE");
  if let Some(active) = query.active {
    qb.push(" AND c.active = ").push_bind(active);
  }
  if let Some(term) = query.search_term() {
    let pattern = like_pattern(term);
    qb.push(" AND (c.full_name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR c.email ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR c.phone ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

fn push_employee_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EmployeeQuery) {
  qb.push(" WHERE TRUE");
  if let Some(role) = query.role {
    qb.push(" AND e.role = ").push_bind(role.as_str());
  }
  if let Some(term) = query.search_term() {
    let pattern = like_pattern(term);
    qb.push(" AND (e.full_name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR e.username ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
}

fn to_i64(value: u64) -> i64 {
  i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(count: i64) -> u64 {
  u64::try_from(count).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl BookstoreStore for PgStore {
  async fn list_categories(&self) -> StoreResult<Vec<Category>> {
    let rows: Vec<CategoryRow> = sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name ASC, id ASC")
      .fetch_all(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(rows.into_iter().map(Category::from).collect())
  }

  async fn get_category(&self, category_id: Uuid) -> StoreResult<Option<Category>> {
    let row: Option<CategoryRow> = sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1")
      .bind(category_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(Category::from))
  }

  async fn insert_category(&self, new_category: NewCategory) -> StoreResult<Category> {
    let row: CategoryRow =
      sqlx::query_as("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) RETURNING id, name, description")
        .bind(Uuid::new_v4())
        .bind(&new_category.name)
        .bind(&new_category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
    Ok(row.into())
  }

  async fn update_category(&self, category_id: Uuid, changes: NewCategory) -> StoreResult<Option<Category>> {
    let row: Option<CategoryRow> = sqlx::query_as(
      "UPDATE categories SET name = $2, description = $3 WHERE id = $1 RETURNING id, name, description",
    )
    .bind(category_id)
    .bind(&changes.name)
    .bind(&changes.description)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Category::from))
  }

  async fn list_books(&self, query: &BookQuery) -> StoreResult<Page<Book>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
    push_book_filters(&mut count_qb, query);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
    push_book_filters(&mut qb, query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
      .push_bind(i64::from(query.page.limit()))
      .push(" OFFSET ")
      .push_bind(to_i64(query.page.offset()));
    let rows: Vec<BookRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(db_err)?;

    let books = rows.into_iter().map(Book::from).collect();
    Ok(Page::new(books, query.page, to_u64(total)))
  }

  async fn get_book(&self, book_id: Uuid) -> StoreResult<Option<Book>> {
    let row: Option<BookRow> = sqlx::query_as(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
      .bind(book_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(row.map(Book::from))
  }

  async fn get_books(&self, book_ids: &[Uuid]) -> StoreResult<Vec<Book>> {
    if book_ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<BookRow> = sqlx::query_as(&format!("SELECT {} FROM books WHERE id = ANY($1)", BOOK_COLUMNS))
      .bind(book_ids)
      .fetch_all(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(rows.into_iter().map(Book::from).collect())
  }

  async fn insert_book(&self, new_book: NewBook) -> StoreResult<Book> {
    let book = Book::from_new(new_book);
    sqlx::query(
      "INSERT INTO books (id, title, author, genre, description, category_id, price, stock_quantity, cover_image, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.genre)
    .bind(&book.description)
    .bind(book.category_id)
    .bind(book.price)
    .bind(book.stock_quantity)
    .bind(&book.cover_image)
    .bind(book.created_at)
    .execute(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(book)
  }

  async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> StoreResult<Option<Book>> {
    let row: Option<BookRow> = sqlx::query_as(&format!(
      "UPDATE books SET title = $2, author = $3, genre = $4, description = $5, category_id = $6, \
       price = $7, stock_quantity = $8, cover_image = $9 WHERE id = $1 RETURNING {}",
      BOOK_COLUMNS
    ))
    .bind(book_id)
    .bind(&changes.title)
    .bind(&changes.author)
    .bind(&changes.genre)
    .bind(&changes.description)
    .bind(changes.category_id)
    .bind(changes.price)
    .bind(changes.stock_quantity)
    .bind(&changes.cover_image)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Book::from))
  }

  async fn cart_lines(&self, customer_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let rows: Vec<CartLineRow> = sqlx::query_as(&format!(
      "SELECT {} FROM cart_lines WHERE customer_id = $1 ORDER BY updated_at DESC, book_id ASC",
      CART_COLUMNS
    ))
    .bind(customer_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(CartLine::from).collect())
  }

  async fn cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<Option<CartLine>> {
    let row: Option<CartLineRow> = sqlx::query_as(&format!(
      "SELECT {} FROM cart_lines WHERE customer_id = $1 AND book_id = $2",
      CART_COLUMNS
    ))
    .bind(customer_id)
    .bind(book_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(CartLine::from))
  }

  async fn upsert_cart_line(&self, line: CartLine) -> StoreResult<CartLine> {
    let row: CartLineRow = sqlx::query_as(&format!(
      "INSERT INTO cart_lines (customer_id, book_id, quantity, line_total, updated_at) VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (customer_id, book_id) DO UPDATE \
       SET quantity = EXCLUDED.quantity, line_total = EXCLUDED.line_total, updated_at = EXCLUDED.updated_at \
       RETURNING {}",
      CART_COLUMNS
    ))
    .bind(line.customer_id)
    .bind(line.book_id)
    .bind(line.quantity)
    .bind(line.line_total)
    .bind(line.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.into())
  }

  async fn delete_cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE customer_id = $1 AND book_id = $2")
      .bind(customer_id)
      .bind(book_id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear_cart(&self, customer_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE customer_id = $1")
      .bind(customer_id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected())
  }

  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Page<OrderSummary>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
    push_order_filters(&mut count_qb, filter);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)?;

    let mut qb = QueryBuilder::<Postgres>::new(
      "SELECT o.id, o.customer_id, o.handled_by, o.total, o.status, o.note, o.created_at, \
       (SELECT COUNT(*) FROM order_lines l WHERE l.order_id = o.id) AS item_count, \
       p.status AS payment_status \
       FROM orders o LEFT JOIN payments p ON p.order_id = o.id",
    );
    push_order_filters(&mut qb, filter);
    qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
      .push_bind(i64::from(filter.page.limit()))
      .push(" OFFSET ")
      .push_bind(to_i64(filter.page.offset()));
    let rows: Vec<OrderSummaryRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(db_err)?;

    let summaries = rows
      .into_iter()
      .map(OrderSummary::try_from)
      .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(summaries, filter.page, to_u64(total)))
  }

  async fn order_detail(&self, order_id: Uuid) -> StoreResult<Option<OrderDetail>> {
    let order_row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(db_err)?;
    let Some(order_row) = order_row else {
      return Ok(None);
    };

    let item_rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT l.book_id, b.title, b.author, b.cover_image, l.unit_price, l.quantity, l.line_total \
       FROM order_lines l JOIN books b ON b.id = l.book_id \
       WHERE l.order_id = $1 ORDER BY l.seq ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(db_err)?;

    let payment = self.get_payment(order_id).await?;
    Ok(Some(OrderDetail {
      order: Order::try_from(order_row)?,
      items: item_rows.into_iter().map(Into::into).collect(),
      payment,
    }))
  }

  async fn get_payment(&self, order_id: Uuid) -> StoreResult<Option<Payment>> {
    let row: Option<PaymentRow> =
      sqlx::query_as(&format!("SELECT {} FROM payments WHERE order_id = $1", PAYMENT_COLUMNS))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
    row.map(Payment::try_from).transpose()
  }

  async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<Page<CustomerSummary>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers c");
    push_customer_filters(&mut count_qb, query);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)?;

    let mut qb = QueryBuilder::<Postgres>::new(
      "SELECT c.id, c.full_name, c.email, c.phone, c.address, c.active, c.registered_at, \
       (SELECT COUNT(*) FROM orders o WHERE o.customer_id = c.id) AS order_count, \
       (SELECT COALESCE(SUM(o.total), 0)::BIGINT FROM orders o WHERE o.customer_id = c.id AND o.status = ",
    );
    qb.push_bind(OrderStatus::Completed.as_str())
      .push(") AS total_spent FROM customers c");
    push_customer_filters(&mut qb, query);
    qb.push(" ORDER BY c.registered_at DESC, c.id DESC LIMIT ")
      .push_bind(i64::from(query.page.limit()))
      .push(" OFFSET ")
      .push_bind(to_i64(query.page.offset()));
    let rows: Vec<CustomerSummaryRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(db_err)?;

    let summaries = rows.into_iter().map(CustomerSummary::from).collect();
    Ok(Page::new(summaries, query.page, to_u64(total)))
  }

  async fn get_customer(&self, customer_id: Uuid) -> StoreResult<Option<Customer>> {
    let row: Option<CustomerRow> =
      sqlx::query_as(&format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
    Ok(row.map(Customer::from))
  }

  async fn customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
    let row: Option<CustomerRow> = sqlx::query_as(&format!(
      "SELECT {} FROM customers WHERE lower(email) = lower($1)",
      CUSTOMER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Customer::from))
  }

  async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer> {
    sqlx::query(
      "INSERT INTO customers (id, full_name, email, phone, address, active, registered_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(customer.id)
    .bind(&customer.full_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.active)
    .bind(customer.registered_at)
    .execute(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(customer)
  }

  async fn update_customer(&self, customer_id: Uuid, changes: CustomerChanges) -> StoreResult<Option<Customer>> {
    let row: Option<CustomerRow> = sqlx::query_as(&format!(
      "UPDATE customers SET full_name = $2, email = $3, phone = $4, address = $5 WHERE id = $1 RETURNING {}",
      CUSTOMER_COLUMNS
    ))
    .bind(customer_id)
    .bind(&changes.full_name)
    .bind(&changes.email)
    .bind(&changes.phone)
    .bind(&changes.address)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Customer::from))
  }

  async fn set_customer_active(&self, customer_id: Uuid, active: bool) -> StoreResult<Option<Customer>> {
    let row: Option<CustomerRow> = sqlx::query_as(&format!(
      "UPDATE customers SET active = $2 WHERE id = $1 RETURNING {}",
      CUSTOMER_COLUMNS
    ))
    .bind(customer_id)
    .bind(active)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    Ok(row.map(Customer::from))
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Page<EmployeeSummary>> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees e");
    push_employee_filters(&mut count_qb, query);
    let total: i64 = count_qb
      .build_query_scalar()
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)?;

    let mut qb = QueryBuilder::<Postgres>::new(
      "SELECT e.id, e.username, e.full_name, e.role, e.created_at, \
       (SELECT COUNT(*) FROM orders o WHERE o.handled_by = e.id) AS handled_orders \
       FROM employees e",
    );
    push_employee_filters(&mut qb, query);
    qb.push(" ORDER BY e.created_at DESC, e.id DESC LIMIT ")
      .push_bind(i64::from(query.page.limit()))
      .push(" OFFSET ")
      .push_bind(to_i64(query.page.offset()));
    let rows: Vec<EmployeeSummaryRow> = qb.build_query_as().fetch_all(&self.pool).await.map_err(db_err)?;

    let summaries = rows
      .into_iter()
      .map(EmployeeSummary::try_from)
      .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(summaries, query.page, to_u64(total)))
  }

  async fn get_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>> {
    let row: Option<EmployeeRow> =
      sqlx::query_as(&format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
    row.map(Employee::try_from).transpose()
  }

  async fn employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
    let row: Option<EmployeeRow> = sqlx::query_as(&format!(
      "SELECT {} FROM employees WHERE lower(username) = lower($1)",
      EMPLOYEE_COLUMNS
    ))
    .bind(username)
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    row.map(Employee::try_from).transpose()
  }

  async fn insert_employee(&self, employee: Employee) -> StoreResult<Employee> {
    sqlx::query("INSERT INTO employees (id, username, full_name, role, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(employee.id)
      .bind(&employee.username)
      .bind(&employee.full_name)
      .bind(employee.role.as_str())
      .bind(employee.created_at)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(employee)
  }

  async fn update_employee(&self, employee_id: Uuid, changes: EmployeeChanges) -> StoreResult<Option<Employee>> {
    let row: Option<EmployeeRow> = sqlx::query_as(&format!(
      "UPDATE employees SET username = $2, full_name = $3, role = $4 WHERE id = $1 RETURNING {}",
      EMPLOYEE_COLUMNS
    ))
    .bind(employee_id)
    .bind(&changes.username)
    .bind(&changes.full_name)
    .bind(changes.role.as_str())
    .fetch_optional(&self.pool)
    .await
    .map_err(db_err)?;
    row.map(Employee::try_from).transpose()
  }

  async fn delete_employee(&self, employee_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
      .bind(employee_id)
      .execute(&self.pool)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() > 0)
  }

  async fn employee_has_orders(&self, employee_id: Uuid) -> StoreResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE handled_by = $1)")
      .bind(employee_id)
      .fetch_one(&self.pool)
      .await
      .map_err(db_err)
  }

  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await.map_err(db_err)?;
    debug!("PostgreSQL transaction opened.");
    Ok(Box::new(PgTx { tx }))
  }
}

pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
  async fn lock_book(&mut self, book_id: Uuid) -> StoreResult<Option<Book>> {
    let row: Option<BookRow> =
      sqlx::query_as(&format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS))
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
    Ok(row.map(Book::from))
  }

  async fn decrement_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<StockUpdate> {
    let remaining: Option<i32> = sqlx::query_scalar(
      "UPDATE books SET stock_quantity = stock_quantity - $2 \
       WHERE id = $1 AND stock_quantity >= $2 RETURNING stock_quantity",
    )
    .bind(book_id)
    .bind(quantity)
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(match remaining {
      Some(remaining) => StockUpdate::Decremented { remaining },
      None => StockUpdate::Insufficient,
    })
  }

  async fn increment_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<()> {
    let result = sqlx::query("UPDATE books SET stock_quantity = stock_quantity + $2 WHERE id = $1")
      .bind(book_id)
      .bind(quantity)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::Corrupt(format!("cannot restock unknown book {}", book_id)));
    }
    Ok(())
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, customer_id, handled_by, total, status, note, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order.id)
    .bind(order.customer_id)
    .bind(order.handled_by)
    .bind(order.total)
    .bind(order.status.as_str())
    .bind(&order.note)
    .bind(order.created_at)
    .execute(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(())
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO order_lines (order_id, book_id, quantity, unit_price, line_total) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(line.order_id)
    .bind(line.book_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.line_total)
    .execute(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(())
  }

  async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO payments (id, order_id, method, amount, status, paid_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(payment.id)
    .bind(payment.order_id)
    .bind(payment.method.as_str())
    .bind(payment.amount)
    .bind(payment.status.as_str())
    .bind(payment.paid_at)
    .execute(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(())
  }

  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> =
      sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS))
        .bind(order_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
    row.map(Order::try_from).transpose()
  }

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    let rows: Vec<OrderLineRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_lines WHERE order_id = $1 ORDER BY seq ASC",
      ORDER_LINE_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
  }

  async fn set_order_status(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    handled_by: Option<Uuid>,
  ) -> StoreResult<()> {
    let result = sqlx::query("UPDATE orders SET status = $2, handled_by = COALESCE($3, handled_by) WHERE id = $1")
      .bind(order_id)
      .bind(status.as_str())
      .bind(handled_by)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::Corrupt(format!("status update for unknown order {}", order_id)));
    }
    Ok(())
  }

  async fn lock_payment(&mut self, order_id: Uuid) -> StoreResult<Option<Payment>> {
    let row: Option<PaymentRow> = sqlx::query_as(&format!(
      "SELECT {} FROM payments WHERE order_id = $1 FOR UPDATE",
      PAYMENT_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(db_err)?;
    row.map(Payment::try_from).transpose()
  }

  async fn update_payment(&mut self, payment: &Payment) -> StoreResult<()> {
    sqlx::query("UPDATE payments SET method = $2, amount = $3, status = $4, paid_at = $5 WHERE id = $1")
      .bind(payment.id)
      .bind(payment.method.as_str())
      .bind(payment.amount)
      .bind(payment.status.as_str())
      .bind(payment.paid_at)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    Ok(())
  }

  async fn lock_cart_lines(&mut self, customer_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let rows: Vec<CartLineRow> = sqlx::query_as(&format!(
      "SELECT {} FROM cart_lines WHERE customer_id = $1 ORDER BY updated_at DESC, book_id ASC FOR UPDATE",
      CART_COLUMNS
    ))
    .bind(customer_id)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(db_err)?;
    Ok(rows.into_iter().map(CartLine::from).collect())
  }

  async fn remove_cart_lines(&mut self, customer_id: Uuid, book_ids: &[Uuid]) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE customer_id = $1 AND book_id = ANY($2)")
      .bind(customer_id)
      .bind(book_ids)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected())
  }

  async fn book_has_order_lines(&mut self, book_id: Uuid) -> StoreResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_lines WHERE book_id = $1)")
      .bind(book_id)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(db_err)
  }

  async fn delete_book(&mut self, book_id: Uuid) -> StoreResult<bool> {
    // cart_lines cascade.
    let result = sqlx::query("DELETE FROM books WHERE id = $1")
      .bind(book_id)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() > 0)
  }

  async fn lock_category(&mut self, category_id: Uuid) -> StoreResult<Option<Category>> {
    let row: Option<CategoryRow> =
      sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1 FOR UPDATE")
        .bind(category_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;
    Ok(row.map(Category::from))
  }

  async fn category_has_books(&mut self, category_id: Uuid) -> StoreResult<bool> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE category_id = $1)")
      .bind(category_id)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(db_err)
  }

  async fn delete_category(&mut self, category_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(category_id)
      .execute(&mut *self.tx)
      .await
      .map_err(db_err)?;
    Ok(result.rows_affected() > 0)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(db_err)?;
    debug!("PostgreSQL transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await.map_err(db_err)?;
    debug!("PostgreSQL transaction rolled back.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_pattern("Nam Cao"), "%Nam Cao%");
  }

  #[test]
  fn book_filters_bind_search_twice() {
    let query = BookQuery {
      search: Some("tô hoài".to_string()),
      category_id: Some(Uuid::nil()),
      ..Default::default()
    };
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
    push_book_filters(&mut qb, &query);
    assert_eq!(
      qb.sql(),
      "SELECT COUNT(*) FROM books WHERE TRUE AND category_id = $1 AND (title ILIKE $2 OR author ILIKE $3)"
    );
  }

  #[test]
  fn customer_filters_search_three_columns() {
    let query = CustomerQuery {
      search: Some("bình".to_string()),
      active: Some(true),
      ..Default::default()
    };
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers c");
    push_customer_filters(&mut qb, &query);
    assert_eq!(
      qb.sql(),
      "SELECT COUNT(*) FROM customers c WHERE TRUE AND c.active = $1 \
       AND (c.full_name ILIKE $2 OR c.email ILIKE $3 OR c.phone ILIKE $4)"
    );
  }
}
