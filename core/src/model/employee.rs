// core/src/model/employee.rs

use crate::access::StaffRole;
use crate::pagination::PageRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff record. The id matches `X-Employee-ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: Uuid,
  /// Login name at the identity provider. Unique.
  pub username: String,
  pub full_name: String,
  pub role: StaffRole,
  pub created_at: DateTime<Utc>,
}

impl Employee {
  pub fn from_new(new_employee: NewEmployee) -> Self {
    Self {
      id: new_employee.id.unwrap_or_else(Uuid::new_v4),
      username: new_employee.username,
      full_name: new_employee.full_name,
      role: new_employee.role,
      created_at: Utc::now(),
    }
  }

  pub fn apply(&mut self, changes: EmployeeChanges) {
    self.username = changes.username;
    self.full_name = changes.full_name;
    self.role = changes.role;
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
  #[serde(default)]
  pub id: Option<Uuid>,
  pub username: String,
  pub full_name: String,
  #[serde(default = "default_role")]
  pub role: StaffRole,
}

fn default_role() -> StaffRole {
  StaffRole::Clerk
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeChanges {
  pub username: String,
  pub full_name: String,
  pub role: StaffRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
  #[serde(flatten)]
  pub employee: Employee,
  /// Orders this employee placed or moved.
  pub handled_orders: i64,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
  pub page: PageRequest,
  /// Case-insensitive substring of name or username.
  pub search: Option<String>,
  pub role: Option<StaffRole>,
}

impl EmployeeQuery {
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())
  }

  pub fn matches(&self, employee: &Employee) -> bool {
    if self.role.is_some_and(|role| role != employee.role) {
      return false;
    }
    match self.search_term() {
      Some(term) => {
        let needle = term.to_lowercase();
        employee.full_name.to_lowercase().contains(&needle) || employee.username.to_lowercase().contains(&needle)
      }
      None => true,
    }
  }
}
