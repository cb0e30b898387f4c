// core/src/employees.rs

//! Staff records. Managers can look them up; only administrators change them.

use crate::access::Actor;
use crate::error::{BookstoreError, Result};
use crate::model::{Employee, EmployeeChanges, EmployeeQuery, EmployeeSummary, NewEmployee};
use crate::pagination::Page;
use crate::store::BookstoreStore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn validate(changes: EmployeeChanges) -> Result<EmployeeChanges> {
  let username = changes.username.trim().to_string();
  if username.is_empty() || username.chars().any(char::is_whitespace) {
    return Err(BookstoreError::Validation(
      "username must be non-empty and contain no spaces".to_string(),
    ));
  }
  let full_name = changes.full_name.trim().to_string();
  if full_name.is_empty() {
    return Err(BookstoreError::Validation("fullName must not be empty".to_string()));
  }
  Ok(EmployeeChanges {
    username,
    full_name,
    role: changes.role,
  })
}

async fn ensure_username_free(store: &dyn BookstoreStore, username: &str, own_id: Option<Uuid>) -> Result<()> {
  match store.employee_by_username(username).await? {
    Some(existing) if Some(existing.id) != own_id => Err(BookstoreError::AlreadyExists(format!(
      "Username '{}'",
      username
    ))),
    _ => Ok(()),
  }
}

#[instrument(name = "employees::list_employees", skip(store, actor))]
pub async fn list_employees(
  store: &dyn BookstoreStore,
  actor: &Actor,
  query: EmployeeQuery,
) -> Result<Page<EmployeeSummary>> {
  actor.ensure_manager()?;
  Ok(store.list_employees(&query).await?)
}

#[instrument(name = "employees::get_employee", skip(store, actor))]
pub async fn get_employee(store: &dyn BookstoreStore, actor: &Actor, employee_id: Uuid) -> Result<Employee> {
  actor.ensure_manager()?;
  store
    .get_employee(employee_id)
    .await?
    .ok_or(BookstoreError::EmployeeNotFound { employee_id })
}

#[instrument(name = "employees::create_employee", skip(store, actor, input))]
pub async fn create_employee(store: &dyn BookstoreStore, actor: &Actor, input: NewEmployee) -> Result<Employee> {
  actor.ensure_admin()?;
  let checked = validate(EmployeeChanges {
    username: input.username,
    full_name: input.full_name,
    role: input.role,
  })?;
  if let Some(id) = input.id {
    if store.get_employee(id).await?.is_some() {
      return Err(BookstoreError::AlreadyExists(format!("Employee id {}", id)));
    }
  }
  ensure_username_free(store, &checked.username, None).await?;

  let employee = store
    .insert_employee(Employee::from_new(NewEmployee {
      id: input.id,
      username: checked.username,
      full_name: checked.full_name,
      role: checked.role,
    }))
    .await?;
  info!("Employee {} ({}) created as {}.", employee.id, employee.username, employee.role);
  Ok(employee)
}

#[instrument(name = "employees::update_employee", skip(store, actor, changes))]
pub async fn update_employee(
  store: &dyn BookstoreStore,
  actor: &Actor,
  employee_id: Uuid,
  changes: EmployeeChanges,
) -> Result<Employee> {
  actor.ensure_admin()?;
  let changes = validate(changes)?;
  ensure_username_free(store, &changes.username, Some(employee_id)).await?;
  let employee = store
    .update_employee(employee_id, changes)
    .await?
    .ok_or(BookstoreError::EmployeeNotFound { employee_id })?;
  info!("Employee {} updated.", employee.id);
  Ok(employee)
}

/// Removes a staff record. Nobody deletes their own record, and staff who
/// handled orders stay on file.
#[instrument(name = "employees::delete_employee", skip(store, actor))]
pub async fn delete_employee(store: &dyn BookstoreStore, actor: &Actor, employee_id: Uuid) -> Result<()> {
  actor.ensure_admin()?;
  if actor.employee_id() == Some(employee_id) {
    return Err(BookstoreError::Validation("Employees cannot delete their own record".to_string()));
  }
  if store.get_employee(employee_id).await?.is_none() {
    return Err(BookstoreError::EmployeeNotFound { employee_id });
  }
  if store.employee_has_orders(employee_id).await? {
    warn!("Refusing to delete employee {}: they handled orders.", employee_id);
    return Err(BookstoreError::EmployeeInUse { employee_id });
  }
  if !store.delete_employee(employee_id).await? {
    return Err(BookstoreError::EmployeeNotFound { employee_id });
  }
  info!("Employee {} deleted.", employee_id);
  Ok(())
}
