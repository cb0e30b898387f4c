// core/src/model/customer.rs

use crate::pagination::PageRequest;
use crate::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer profile. The id is the one the identity provider sends in
/// `X-Customer-ID`; credentials live there, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: Uuid,
  pub full_name: String,
  /// Unique across customers, compared case-insensitively.
  pub email: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  /// Deactivated customers keep their history but cannot place orders.
  pub active: bool,
  pub registered_at: DateTime<Utc>,
}

impl Customer {
  pub fn from_new(new_customer: NewCustomer) -> Self {
    Self {
      id: new_customer.id.unwrap_or_else(Uuid::new_v4),
      full_name: new_customer.full_name,
      email: new_customer.email,
      phone: new_customer.phone,
      address: new_customer.address,
      active: true,
      registered_at: Utc::now(),
    }
  }

  pub fn apply(&mut self, changes: CustomerChanges) {
    self.full_name = changes.full_name;
    self.email = changes.email;
    self.phone = changes.phone;
    self.address = changes.address;
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
  /// Identity-provider id; generated when absent.
  #[serde(default)]
  pub id: Option<Uuid>,
  pub full_name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
}

/// Full replacement of a customer's editable fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerChanges {
  pub full_name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
}

/// Listing row with order aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
  #[serde(flatten)]
  pub customer: Customer,
  pub order_count: i64,
  /// Sum of completed order totals.
  pub total_spent: Money,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
  pub page: PageRequest,
  /// Case-insensitive substring of name, email or phone.
  pub search: Option<String>,
  pub active: Option<bool>,
}

impl CustomerQuery {
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())
  }

  pub fn matches(&self, customer: &Customer) -> bool {
    if let Some(active) = self.active {
      if customer.active != active {
        return false;
      }
    }
    match self.search_term() {
      Some(term) => {
        let needle = term.to_lowercase();
        customer.full_name.to_lowercase().contains(&needle)
          || customer.email.to_lowercase().contains(&needle)
          || customer
            .phone
            .as_deref()
            .is_some_and(|phone| phone.to_lowercase().contains(&needle))
      }
      None => true,
    }
  }
}
