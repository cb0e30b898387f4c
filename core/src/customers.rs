// core/src/customers.rs

//! Customer profiles. Administrators and managers maintain them; a customer
//! may read their own.

use crate::access::Actor;
use crate::error::{BookstoreError, Result};
use crate::model::{Customer, CustomerChanges, CustomerQuery, CustomerSummary, NewCustomer};
use crate::pagination::Page;
use crate::store::BookstoreStore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(BookstoreError::Validation(format!("{} must not be empty", field)));
  }
  Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_email(email: &str) -> Result<String> {
  let email = required("email", email)?;
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
    _ => Err(BookstoreError::Validation(format!("'{}' is not an email address", email))),
  }
}

fn validate_changes(changes: CustomerChanges) -> Result<CustomerChanges> {
  Ok(CustomerChanges {
    full_name: required("fullName", &changes.full_name)?,
    email: validate_email(&changes.email)?,
    phone: optional(changes.phone),
    address: optional(changes.address),
  })
}

async fn ensure_email_free(store: &dyn BookstoreStore, email: &str, own_id: Option<Uuid>) -> Result<()> {
  match store.customer_by_email(email).await? {
    Some(existing) if Some(existing.id) != own_id => {
      warn!("Email {} already belongs to customer {}.", email, existing.id);
      Err(BookstoreError::AlreadyExists(format!("Email '{}'", email)))
    }
    _ => Ok(()),
  }
}

#[instrument(name = "customers::list_customers", skip(store, actor))]
pub async fn list_customers(
  store: &dyn BookstoreStore,
  actor: &Actor,
  query: CustomerQuery,
) -> Result<Page<CustomerSummary>> {
  actor.ensure_manager()?;
  Ok(store.list_customers(&query).await?)
}

#[instrument(name = "customers::get_customer", skip(store, actor))]
pub async fn get_customer(store: &dyn BookstoreStore, actor: &Actor, customer_id: Uuid) -> Result<Customer> {
  if !matches!(actor, Actor::Customer { customer_id: own } if *own == customer_id) {
    actor.ensure_manager()?;
  }
  store
    .get_customer(customer_id)
    .await?
    .ok_or(BookstoreError::CustomerNotFound { customer_id })
}

#[instrument(name = "customers::create_customer", skip(store, actor, input))]
pub async fn create_customer(store: &dyn BookstoreStore, actor: &Actor, input: NewCustomer) -> Result<Customer> {
  actor.ensure_manager()?;
  let changes = validate_changes(CustomerChanges {
    full_name: input.full_name,
    email: input.email,
    phone: input.phone,
    address: input.address,
  })?;
  if let Some(id) = input.id {
    if store.get_customer(id).await?.is_some() {
      return Err(BookstoreError::AlreadyExists(format!("Customer id {}", id)));
    }
  }
  ensure_email_free(store, &changes.email, None).await?;

  let customer = store
    .insert_customer(Customer::from_new(NewCustomer {
      id: input.id,
      full_name: changes.full_name,
      email: changes.email,
      phone: changes.phone,
      address: changes.address,
    }))
    .await?;
  info!("Customer {} created.", customer.id);
  Ok(customer)
}

#[instrument(name = "customers::update_customer", skip(store, actor, changes))]
pub async fn update_customer(
  store: &dyn BookstoreStore,
  actor: &Actor,
  customer_id: Uuid,
  changes: CustomerChanges,
) -> Result<Customer> {
  actor.ensure_manager()?;
  let changes = validate_changes(changes)?;
  ensure_email_free(store, &changes.email, Some(customer_id)).await?;
  let customer = store
    .update_customer(customer_id, changes)
    .await?
    .ok_or(BookstoreError::CustomerNotFound { customer_id })?;
  info!("Customer {} updated.", customer.id);
  Ok(customer)
}

/// Activates or deactivates an account. Deactivated customers cannot order.
#[instrument(name = "customers::set_customer_active", skip(store, actor))]
pub async fn set_customer_active(
  store: &dyn BookstoreStore,
  actor: &Actor,
  customer_id: Uuid,
  active: bool,
) -> Result<Customer> {
  actor.ensure_manager()?;
  let customer = store
    .set_customer_active(customer_id, active)
    .await?
    .ok_or(BookstoreError::CustomerNotFound { customer_id })?;
  info!(
    "Customer {} {}.",
    customer.id,
    if active { "activated" } else { "deactivated" }
  );
  Ok(customer)
}
