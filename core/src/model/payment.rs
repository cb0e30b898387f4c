// core/src/model/payment.rs

use crate::error::BookstoreError;
use crate::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
  /// Cash on delivery; nothing is collected up front.
  #[default]
  #[serde(rename = "COD")]
  CashOnDelivery,
  #[serde(rename = "ChuyenKhoan")]
  BankTransfer,
  #[serde(rename = "ViDienTu")]
  EWallet,
}

impl PaymentMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "COD",
      PaymentMethod::BankTransfer => "ChuyenKhoan",
      PaymentMethod::EWallet => "ViDienTu",
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentMethod {
  type Err = BookstoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    [PaymentMethod::CashOnDelivery, PaymentMethod::BankTransfer, PaymentMethod::EWallet]
      .into_iter()
      .find(|method| method.as_str() == s)
      .ok_or_else(|| BookstoreError::Validation(format!("Unknown payment method '{}'", s)))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  #[default]
  Pending,
  Success,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Success => "success",
      PaymentStatus::Failed => "failed",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = BookstoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(PaymentStatus::Pending),
      "success" => Ok(PaymentStatus::Success),
      "failed" => Ok(PaymentStatus::Failed),
      other => Err(BookstoreError::Validation(format!("Unknown payment status '{}'", other))),
    }
  }
}

/// Payment record; exactly one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id: Uuid,
  pub order_id: Uuid,
  pub method: PaymentMethod,
  pub amount: Money,
  pub status: PaymentStatus,
  /// Set exactly when `status` is `Success`.
  pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
  /// The stub written alongside a new order.
  pub fn pending(order_id: Uuid, method: PaymentMethod, amount: Money) -> Self {
    Self {
      id: Uuid::new_v4(),
      order_id,
      method,
      amount,
      status: PaymentStatus::Pending,
      paid_at: None,
    }
  }

  /// Moves to `status`, keeping `paid_at` consistent with it.
  pub fn set_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
    self.paid_at = match status {
      PaymentStatus::Success => self.paid_at.filter(|_| self.status == PaymentStatus::Success).or(Some(now)),
      PaymentStatus::Pending | PaymentStatus::Failed => None,
    };
    self.status = status;
  }
}
