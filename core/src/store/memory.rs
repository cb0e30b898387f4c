// core/src/store/memory.rs

//! A process-local [`BookstoreStore`].
//!
//! Transactions hold the store's async mutex for their whole lifetime and
//! write to a private copy of the state, which replaces the shared state only
//! on commit. Transactions are therefore fully serialized, and an abandoned
//! transaction leaves no trace.

use crate::error::{StoreError, StoreResult};
use crate::model::{
  Book, BookChanges, BookQuery, CartLine, Category, Customer, CustomerChanges, CustomerQuery, CustomerSummary,
  Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewBook, NewCategory, Order, OrderDetail, OrderFilter,
  OrderItemView, OrderLine, OrderStatus, OrderSummary, Payment,
};
use crate::pagination::Page;
use crate::store::{BookstoreStore, StockUpdate, StoreTx};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
  categories: HashMap<Uuid, Category>,
  books: HashMap<Uuid, Book>,
  carts: HashMap<(Uuid, Uuid), CartLine>,
  orders: HashMap<Uuid, Order>,
  order_lines: HashMap<Uuid, Vec<OrderLine>>,
  payments: HashMap<Uuid, Payment>,
  customers: HashMap<Uuid, Customer>,
  employees: HashMap<Uuid, Employee>,
}

impl MemoryState {
  fn order_detail(&self, order_id: Uuid) -> Option<OrderDetail> {
    let order = self.orders.get(&order_id)?.clone();
    let items = self
      .order_lines
      .get(&order_id)
      .map(|lines| {
        lines
          .iter()
          .map(|line| {
            let book = self.books.get(&line.book_id);
            OrderItemView {
              book_id: line.book_id,
              title: book.map(|b| b.title.clone()).unwrap_or_default(),
              author: book.map(|b| b.author.clone()).unwrap_or_default(),
              cover_image: book.and_then(|b| b.cover_image.clone()),
              unit_price: line.unit_price,
              quantity: line.quantity,
              line_total: line.line_total,
            }
          })
          .collect()
      })
      .unwrap_or_default();
    let payment = self.payments.get(&order_id).cloned();
    Some(OrderDetail { order, items, payment })
  }

  fn sorted_cart(&self, customer_id: Uuid) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = self
      .carts
      .values()
      .filter(|line| line.customer_id == customer_id)
      .cloned()
      .collect();
    lines.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.book_id.cmp(&b.book_id)));
    lines
  }
}

/// Row counts, for asserting what a failed operation left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryCounts {
  pub books: usize,
  pub cart_lines: usize,
  pub orders: usize,
  pub order_lines: usize,
  pub payments: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
  state: Arc<Mutex<MemoryState>>,
  fail_payment_inserts: Arc<AtomicBool>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every subsequent `StoreTx::insert_payment` fail with a backend
  /// error, to exercise rollback paths.
  pub fn fail_payment_inserts(&self, fail: bool) {
    self.fail_payment_inserts.store(fail, Ordering::SeqCst);
  }

  pub async fn counts(&self) -> MemoryCounts {
    let state = self.state.lock().await;
    MemoryCounts {
      books: state.books.len(),
      cart_lines: state.carts.len(),
      orders: state.orders.len(),
      order_lines: state.order_lines.values().map(Vec::len).sum(),
      payments: state.payments.len(),
    }
  }
}

#[async_trait]
impl BookstoreStore for InMemoryStore {
  async fn list_categories(&self) -> StoreResult<Vec<Category>> {
    let state = self.state.lock().await;
    let mut categories: Vec<Category> = state.categories.values().cloned().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(categories)
  }

  async fn get_category(&self, category_id: Uuid) -> StoreResult<Option<Category>> {
    Ok(self.state.lock().await.categories.get(&category_id).cloned())
  }

  async fn insert_category(&self, new_category: NewCategory) -> StoreResult<Category> {
    let category = Category {
      id: Uuid::new_v4(),
      name: new_category.name,
      description: new_category.description,
    };
    self.state.lock().await.categories.insert(category.id, category.clone());
    Ok(category)
  }

  async fn update_category(&self, category_id: Uuid, changes: NewCategory) -> StoreResult<Option<Category>> {
    let mut state = self.state.lock().await;
    Ok(state.categories.get_mut(&category_id).map(|category| {
      category.name = changes.name;
      category.description = changes.description;
      category.clone()
    }))
  }

  async fn list_books(&self, query: &BookQuery) -> StoreResult<Page<Book>> {
    let state = self.state.lock().await;
    let mut matching: Vec<Book> = state.books.values().filter(|book| query.matches(book)).cloned().collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = matching.len() as u64;
    Ok(Page::new(query.page.slice(&matching), query.page, total))
  }

  async fn get_book(&self, book_id: Uuid) -> StoreResult<Option<Book>> {
    Ok(self.state.lock().await.books.get(&book_id).cloned())
  }

  async fn get_books(&self, book_ids: &[Uuid]) -> StoreResult<Vec<Book>> {
    let state = self.state.lock().await;
    Ok(book_ids.iter().filter_map(|id| state.books.get(id).cloned()).collect())
  }

  async fn insert_book(&self, new_book: NewBook) -> StoreResult<Book> {
    let book = Book::from_new(new_book);
    self.state.lock().await.books.insert(book.id, book.clone());
    Ok(book)
  }

  async fn update_book(&self, book_id: Uuid, changes: BookChanges) -> StoreResult<Option<Book>> {
    let mut state = self.state.lock().await;
    Ok(state.books.get_mut(&book_id).map(|book| {
      book.apply(changes);
      book.clone()
    }))
  }

  async fn cart_lines(&self, customer_id: Uuid) -> StoreResult<Vec<CartLine>> {
    Ok(self.state.lock().await.sorted_cart(customer_id))
  }

  async fn cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<Option<CartLine>> {
    Ok(self.state.lock().await.carts.get(&(customer_id, book_id)).cloned())
  }

  async fn upsert_cart_line(&self, line: CartLine) -> StoreResult<CartLine> {
    let mut state = self.state.lock().await;
    if !state.books.contains_key(&line.book_id) {
      return Err(StoreError::Corrupt(format!("cart line references unknown book {}", line.book_id)));
    }
    state.carts.insert((line.customer_id, line.book_id), line.clone());
    Ok(line)
  }

  async fn delete_cart_line(&self, customer_id: Uuid, book_id: Uuid) -> StoreResult<bool> {
    Ok(self.state.lock().await.carts.remove(&(customer_id, book_id)).is_some())
  }

  async fn clear_cart(&self, customer_id: Uuid) -> StoreResult<u64> {
    let mut state = self.state.lock().await;
    let before = state.carts.len();
    state.carts.retain(|(owner, _), _| *owner != customer_id);
    Ok((before - state.carts.len()) as u64)
  }

  async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Page<OrderSummary>> {
    let state = self.state.lock().await;
    let mut matching: Vec<&Order> = state.orders.values().filter(|order| filter.matches(order)).collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = matching.len() as u64;
    let summaries: Vec<OrderSummary> = matching
      .into_iter()
      .map(|order| OrderSummary {
        order: order.clone(),
        item_count: state.order_lines.get(&order.id).map_or(0, |lines| lines.len() as i64),
        payment_status: state.payments.get(&order.id).map(|payment| payment.status),
      })
      .collect();
    Ok(Page::new(filter.page.slice(&summaries), filter.page, total))
  }

  async fn order_detail(&self, order_id: Uuid) -> StoreResult<Option<OrderDetail>> {
    Ok(self.state.lock().await.order_detail(order_id))
  }

  async fn get_payment(&self, order_id: Uuid) -> StoreResult<Option<Payment>> {
    Ok(self.state.lock().await.payments.get(&order_id).cloned())
  }

  async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<Page<CustomerSummary>> {
    let state = self.state.lock().await;
    let mut matching: Vec<&Customer> = state.customers.values().filter(|customer| query.matches(customer)).collect();
    matching.sort_by(|a, b| b.registered_at.cmp(&a.registered_at).then(b.id.cmp(&a.id)));
    let total = matching.len() as u64;
    let summaries: Vec<CustomerSummary> = matching
      .into_iter()
      .map(|customer| {
        let orders = state.orders.values().filter(|order| order.customer_id == customer.id);
        let (order_count, total_spent) = orders.fold((0, 0), |(count, spent), order| {
          let completed = if order.status == OrderStatus::Completed { order.total } else { 0 };
          (count + 1, spent + completed)
        });
        CustomerSummary {
          customer: customer.clone(),
          order_count,
          total_spent,
        }
      })
      .collect();
    Ok(Page::new(query.page.slice(&summaries), query.page, total))
  }

  async fn get_customer(&self, customer_id: Uuid) -> StoreResult<Option<Customer>> {
    Ok(self.state.lock().await.customers.get(&customer_id).cloned())
  }

  async fn customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
    let state = self.state.lock().await;
    let wanted = email.to_lowercase();
    Ok(
      state
        .customers
        .values()
        .find(|customer| customer.email.to_lowercase() == wanted)
        .cloned(),
    )
  }

  async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer> {
    let mut state = self.state.lock().await;
    if state.customers.contains_key(&customer.id) {
      return Err(StoreError::Corrupt(format!("customer {} already exists", customer.id)));
    }
    state.customers.insert(customer.id, customer.clone());
    Ok(customer)
  }

  async fn update_customer(&self, customer_id: Uuid, changes: CustomerChanges) -> StoreResult<Option<Customer>> {
    let mut state = self.state.lock().await;
    Ok(state.customers.get_mut(&customer_id).map(|customer| {
      customer.apply(changes);
      customer.clone()
    }))
  }

  async fn set_customer_active(&self, customer_id: Uuid, active: bool) -> StoreResult<Option<Customer>> {
    let mut state = self.state.lock().await;
    Ok(state.customers.get_mut(&customer_id).map(|customer| {
      customer.active = active;
      customer.clone()
    }))
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Page<EmployeeSummary>> {
    let state = self.state.lock().await;
    let mut matching: Vec<&Employee> = state.employees.values().filter(|employee| query.matches(employee)).collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let total = matching.len() as u64;
    let summaries: Vec<EmployeeSummary> = matching
      .into_iter()
      .map(|employee| EmployeeSummary {
        employee: employee.clone(),
        handled_orders: state
          .orders
          .values()
          .filter(|order| order.handled_by == Some(employee.id))
          .count() as i64,
      })
      .collect();
    Ok(Page::new(query.page.slice(&summaries), query.page, total))
  }

  async fn get_employee(&self, employee_id: Uuid) -> StoreResult<Option<Employee>> {
    Ok(self.state.lock().await.employees.get(&employee_id).cloned())
  }

  async fn employee_by_username(&self, username: &str) -> StoreResult<Option<Employee>> {
    let state = self.state.lock().await;
    let wanted = username.to_lowercase();
    Ok(
      state
        .employees
        .values()
        .find(|employee| employee.username.to_lowercase() == wanted)
        .cloned(),
    )
  }

  async fn insert_employee(&self, employee: Employee) -> StoreResult<Employee> {
    let mut state = self.state.lock().await;
    if state.employees.contains_key(&employee.id) {
      return Err(StoreError::Corrupt(format!("employee {} already exists", employee.id)));
    }
    state.employees.insert(employee.id, employee.clone());
    Ok(employee)
  }

  async fn update_employee(&self, employee_id: Uuid, changes: EmployeeChanges) -> StoreResult<Option<Employee>> {
    let mut state = self.state.lock().await;
    Ok(state.employees.get_mut(&employee_id).map(|employee| {
      employee.apply(changes);
      employee.clone()
    }))
  }

  async fn delete_employee(&self, employee_id: Uuid) -> StoreResult<bool> {
    Ok(self.state.lock().await.employees.remove(&employee_id).is_some())
  }

  async fn employee_has_orders(&self, employee_id: Uuid) -> StoreResult<bool> {
    let state = self.state.lock().await;
    Ok(state.orders.values().any(|order| order.handled_by == Some(employee_id)))
  }

  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let guard = Arc::clone(&self.state).lock_owned().await;
    let working = guard.clone();
    debug!("In-memory transaction opened.");
    Ok(Box::new(MemoryTx {
      guard,
      working,
      fail_payment_inserts: self.fail_payment_inserts.load(Ordering::SeqCst),
    }))
  }
}

struct MemoryTx {
  guard: OwnedMutexGuard<MemoryState>,
  working: MemoryState,
  fail_payment_inserts: bool,
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn lock_book(&mut self, book_id: Uuid) -> StoreResult<Option<Book>> {
    Ok(self.working.books.get(&book_id).cloned())
  }

  async fn decrement_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<StockUpdate> {
    match self.working.books.get_mut(&book_id) {
      Some(book) if book.stock_quantity >= quantity => {
        book.stock_quantity -= quantity;
        Ok(StockUpdate::Decremented {
          remaining: book.stock_quantity,
        })
      }
      _ => Ok(StockUpdate::Insufficient),
    }
  }

  async fn increment_stock(&mut self, book_id: Uuid, quantity: i32) -> StoreResult<()> {
    let book = self
      .working
      .books
      .get_mut(&book_id)
      .ok_or_else(|| StoreError::Corrupt(format!("cannot restock unknown book {}", book_id)))?;
    book.stock_quantity = book.stock_quantity.saturating_add(quantity);
    Ok(())
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    self.working.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()> {
    if !self.working.orders.contains_key(&line.order_id) {
      return Err(StoreError::Corrupt(format!("order line for unknown order {}", line.order_id)));
    }
    self.working.order_lines.entry(line.order_id).or_default().push(line.clone());
    Ok(())
  }

  async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()> {
    if self.fail_payment_inserts {
      warn!(order_id = %payment.order_id, "Injected payment insert failure.");
      return Err(StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::Other,
        "injected payment insert failure",
      )));
    }
    self.working.payments.insert(payment.order_id, payment.clone());
    Ok(())
  }

  async fn lock_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.working.orders.get(&order_id).cloned())
  }

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    Ok(self.working.order_lines.get(&order_id).cloned().unwrap_or_default())
  }

  async fn set_order_status(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    handled_by: Option<Uuid>,
  ) -> StoreResult<()> {
    let order = self
      .working
      .orders
      .get_mut(&order_id)
      .ok_or_else(|| StoreError::Corrupt(format!("status update for unknown order {}", order_id)))?;
    order.status = status;
    if handled_by.is_some() {
      order.handled_by = handled_by;
    }
    Ok(())
  }

  async fn lock_payment(&mut self, order_id: Uuid) -> StoreResult<Option<Payment>> {
    Ok(self.working.payments.get(&order_id).cloned())
  }

  async fn update_payment(&mut self, payment: &Payment) -> StoreResult<()> {
    self.working.payments.insert(payment.order_id, payment.clone());
    Ok(())
  }

  async fn lock_cart_lines(&mut self, customer_id: Uuid) -> StoreResult<Vec<CartLine>> {
    Ok(self.working.sorted_cart(customer_id))
  }

  async fn remove_cart_lines(&mut self, customer_id: Uuid, book_ids: &[Uuid]) -> StoreResult<u64> {
    let mut removed = 0;
    for book_id in book_ids {
      if self.working.carts.remove(&(customer_id, *book_id)).is_some() {
        removed += 1;
      }
    }
    Ok(removed)
  }

  async fn book_has_order_lines(&mut self, book_id: Uuid) -> StoreResult<bool> {
    Ok(self.working.order_lines.values().flatten().any(|line| line.book_id == book_id))
  }

  async fn delete_book(&mut self, book_id: Uuid) -> StoreResult<bool> {
    let existed = self.working.books.remove(&book_id).is_some();
    if existed {
      self.working.carts.retain(|(_, cart_book_id), _| *cart_book_id != book_id);
    }
    Ok(existed)
  }

  async fn lock_category(&mut self, category_id: Uuid) -> StoreResult<Option<Category>> {
    Ok(self.working.categories.get(&category_id).cloned())
  }

  async fn category_has_books(&mut self, category_id: Uuid) -> StoreResult<bool> {
    Ok(self.working.books.values().any(|book| book.category_id == Some(category_id)))
  }

  async fn delete_category(&mut self, category_id: Uuid) -> StoreResult<bool> {
    Ok(self.working.categories.remove(&category_id).is_some())
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryTx { mut guard, working, .. } = *self;
    *guard = working;
    debug!("In-memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    debug!("In-memory transaction rolled back.");
    Ok(())
  }
}
