// core/src/access.rs

//! Who is acting on a request, and what they are allowed to do.
//! Identity is established upstream; this module only answers authorization
//! questions.

use crate::error::{BookstoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
  Admin,
  /// Store manager.
  #[serde(rename = "QuanLy")]
  Manager,
  /// Sales clerk.
  #[serde(rename = "NhanVien")]
  Clerk,
}

impl StaffRole {
  pub fn as_str(self) -> &'static str {
    match self {
      StaffRole::Admin => "Admin",
      StaffRole::Manager => "QuanLy",
      StaffRole::Clerk => "NhanVien",
    }
  }
}

impl fmt::Display for StaffRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StaffRole {
  type Err = BookstoreError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "Admin" => Ok(StaffRole::Admin),
      "QuanLy" => Ok(StaffRole::Manager),
      "NhanVien" => Ok(StaffRole::Clerk),
      other => Err(BookstoreError::Validation(format!("Unknown staff role '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
  Customer { customer_id: Uuid },
  Staff { employee_id: Uuid, role: StaffRole },
}

impl Actor {
  pub fn employee_id(&self) -> Option<Uuid> {
    match self {
      Actor::Staff { employee_id, .. } => Some(*employee_id),
      Actor::Customer { .. } => None,
    }
  }

  pub fn is_staff(&self) -> bool {
    matches!(self, Actor::Staff { .. })
  }

  /// Catalog edits are reserved for administrators and managers.
  pub fn ensure_catalog_editor(&self) -> Result<()> {
    match self {
      Actor::Staff {
        role: StaffRole::Admin | StaffRole::Manager,
        ..
      } => Ok(()),
      _ => Err(BookstoreError::Forbidden(
        "Only administrators and managers can change the catalog".to_string(),
      )),
    }
  }

  /// Customer and staff records are managed by administrators and managers.
  pub fn ensure_manager(&self) -> Result<()> {
    match self {
      Actor::Staff {
        role: StaffRole::Admin | StaffRole::Manager,
        ..
      } => Ok(()),
      _ => Err(BookstoreError::Forbidden(
        "Only administrators and managers can manage accounts".to_string(),
      )),
    }
  }

  pub fn ensure_admin(&self) -> Result<()> {
    match self {
      Actor::Staff {
        role: StaffRole::Admin,
        ..
      } => Ok(()),
      _ => Err(BookstoreError::Forbidden("Administrator access required".to_string())),
    }
  }

  pub fn ensure_staff(&self) -> Result<()> {
    if self.is_staff() {
      Ok(())
    } else {
      Err(BookstoreError::Forbidden("Staff access required".to_string()))
    }
  }

  /// Staff see every order; customers only their own.
  pub fn ensure_can_view_order_of(&self, customer_id: Uuid) -> Result<()> {
    match self {
      Actor::Staff { .. } => Ok(()),
      Actor::Customer { customer_id: own } if *own == customer_id => Ok(()),
      Actor::Customer { .. } => Err(BookstoreError::Forbidden(
        "Customers can only access their own orders".to_string(),
      )),
    }
  }
}
