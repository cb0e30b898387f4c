// server/src/web/extractors.rs

//! Request identity.
//!
//! Authentication happens in front of this service; the gateway forwards the
//! caller's identity in headers:
//!  - `X-Customer-ID: <uuid>` for storefront customers, or
//!  - `X-Employee-ID: <uuid>` plus `X-Employee-Role: Admin|QuanLy|NhanVien` for staff.

use actix_web::{FromRequest, HttpRequest};
use bookstore_core::{Actor, StaffRole};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const CUSTOMER_ID_HEADER: &str = "X-Customer-ID";
pub const EMPLOYEE_ID_HEADER: &str = "X-Employee-ID";
pub const EMPLOYEE_ROLE_HEADER: &str = "X-Employee-Role";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name).and_then(|value| value.to_str().ok())
}

fn parse_uuid_header(req: &HttpRequest, name: &str) -> Result<Option<Uuid>, AppError> {
  match header(req, name) {
    None => Ok(None),
    Some(raw) => Uuid::parse_str(raw.trim())
      .map(Some)
      .map_err(|_| AppError::Auth(format!("Header {} is not a valid UUID.", name))),
  }
}

fn actor_from_headers(req: &HttpRequest) -> Result<Actor, AppError> {
  if let Some(employee_id) = parse_uuid_header(req, EMPLOYEE_ID_HEADER)? {
    let role = header(req, EMPLOYEE_ROLE_HEADER)
      .ok_or_else(|| AppError::Auth(format!("Header {} is required for staff requests.", EMPLOYEE_ROLE_HEADER)))?
      .parse::<StaffRole>()
      .map_err(|e| AppError::Auth(e.to_string()))?;
    return Ok(Actor::Staff { employee_id, role });
  }
  if let Some(customer_id) = parse_uuid_header(req, CUSTOMER_ID_HEADER)? {
    return Ok(Actor::Customer { customer_id });
  }
  Err(AppError::Auth(format!(
    "Authentication required. Send {} or {} and {}.",
    CUSTOMER_ID_HEADER, EMPLOYEE_ID_HEADER, EMPLOYEE_ROLE_HEADER
  )))
}

/// Any authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub Actor);

impl FromRequest for AuthenticatedActor {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = actor_from_headers(req).map(AuthenticatedActor);
    if let Err(err) = &result {
      warn!("AuthenticatedActor extractor: {}", err);
    }
    ready(result)
  }
}

/// A storefront customer; staff identities are refused.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCustomer {
  pub customer_id: Uuid,
}

impl FromRequest for AuthenticatedCustomer {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = actor_from_headers(req).and_then(|actor| match actor {
      Actor::Customer { customer_id } => Ok(AuthenticatedCustomer { customer_id }),
      Actor::Staff { .. } => Err(AppError::Forbidden("This endpoint is for customers only.".to_string())),
    });
    if let Err(err) = &result {
      warn!("AuthenticatedCustomer extractor: {}", err);
    }
    ready(result)
  }
}
