// server/src/web/handlers/employee_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore_core::{employees, EmployeeChanges, EmployeeQuery, NewEmployee, PageRequest, StaffRole};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedActor;

#[derive(Deserialize, Debug)]
pub struct ListEmployeesQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub search: Option<String>,
  pub role: Option<StaffRole>,
}

#[instrument(name = "handler::list_employees", skip(app_state, actor))]
pub async fn list_employees_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListEmployeesQuery>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let params = query_params.into_inner();
  let query = EmployeeQuery {
    page: PageRequest::new(params.page, params.limit),
    search: params.search,
    role: params.role,
  };
  let page = employees::list_employees(app_state.store(), &actor.0, query).await?;
  info!("Listed {} of {} employee(s).", page.items.len(), page.pagination.total_items);

  Ok(HttpResponse::Ok().json(json!({
      "message": "Employees fetched successfully.",
      "employees": page.items,
      "pagination": page.pagination
  })))
}

#[instrument(name = "handler::get_employee", skip(app_state, path, actor), fields(employee_id = %path.as_ref()))]
pub async fn get_employee_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let employee = employees::get_employee(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Employee fetched successfully.",
      "employee": employee
  })))
}

#[instrument(name = "handler::create_employee", skip(app_state, payload, actor))]
pub async fn create_employee_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewEmployee>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let employee = employees::create_employee(app_state.store(), &actor.0, payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
      "message": "Employee created successfully.",
      "employee": employee
  })))
}

#[instrument(name = "handler::update_employee", skip(app_state, path, payload, actor), fields(employee_id = %path.as_ref()))]
pub async fn update_employee_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<EmployeeChanges>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  let employee =
    employees::update_employee(app_state.store(), &actor.0, path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Employee updated successfully.",
      "employee": employee
  })))
}

#[instrument(name = "handler::delete_employee", skip(app_state, path, actor), fields(employee_id = %path.as_ref()))]
pub async fn delete_employee_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  actor: AuthenticatedActor,
) -> Result<HttpResponse, AppError> {
  employees::delete_employee(app_state.store(), &actor.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted successfully." })))
}
