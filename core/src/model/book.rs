// core/src/model/book.rs

use crate::pagination::PageRequest;
use crate::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Above this many units a book is shown as comfortably in stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id: Uuid,
  pub title: String,
  pub author: String,
  pub genre: Option<String>,
  pub description: Option<String>,
  pub category_id: Option<Uuid>,
  pub price: Money,
  /// Sellable units. Never negative.
  pub stock_quantity: i32,
  pub cover_image: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Book {
  /// Builds a fresh catalog entry from validated input.
  pub fn from_new(new_book: NewBook) -> Self {
    Self {
      id: Uuid::new_v4(),
      title: new_book.title,
      author: new_book.author,
      genre: new_book.genre,
      description: new_book.description,
      category_id: new_book.category_id,
      price: new_book.price,
      stock_quantity: new_book.stock_quantity,
      cover_image: new_book.cover_image,
      created_at: Utc::now(),
    }
  }

  /// Replaces every editable field, keeping identity and creation time.
  pub fn apply(&mut self, changes: BookChanges) {
    self.title = changes.title;
    self.author = changes.author;
    self.genre = changes.genre;
    self.description = changes.description;
    self.category_id = changes.category_id;
    self.price = changes.price;
    self.stock_quantity = changes.stock_quantity;
    self.cover_image = changes.cover_image;
  }

  pub fn stock_level(&self) -> StockLevel {
    StockLevel::for_quantity(self.stock_quantity)
  }
}

/// Payload for creating a book.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
  pub title: String,
  pub author: String,
  #[serde(default)]
  pub genre: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  pub price: Money,
  pub stock_quantity: i32,
  #[serde(default)]
  pub cover_image: Option<String>,
}

/// Book updates replace all editable fields, so they share the creation payload.
pub type BookChanges = NewBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockLevel {
  InStock,
  LowStock,
  OutOfStock,
}

impl StockLevel {
  pub fn for_quantity(quantity: i32) -> Self {
    if quantity > LOW_STOCK_THRESHOLD {
      StockLevel::InStock
    } else if quantity > 0 {
      StockLevel::LowStock
    } else {
      StockLevel::OutOfStock
    }
  }
}

/// Catalog listing parameters.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
  pub page: PageRequest,
  /// Case-insensitive substring matched against title and author.
  pub search: Option<String>,
  pub category_id: Option<Uuid>,
}

impl BookQuery {
  /// The search term with surrounding whitespace removed, if anything is left.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())
  }

  pub fn matches(&self, book: &Book) -> bool {
    if let Some(category_id) = self.category_id {
      if book.category_id != Some(category_id) {
        return false;
      }
    }
    match self.search_term() {
      Some(term) => {
        let needle = term.to_lowercase();
        book.title.to_lowercase().contains(&needle) || book.author.to_lowercase().contains(&needle)
      }
      None => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_book(title: &str, author: &str, stock: i32) -> Book {
    Book::from_new(NewBook {
      title: title.to_string(),
      author: author.to_string(),
      genre: None,
      description: None,
      category_id: None,
      price: 10_000,
      stock_quantity: stock,
      cover_image: None,
    })
  }

  #[test]
  fn stock_level_thresholds() {
    assert_eq!(StockLevel::for_quantity(11), StockLevel::InStock);
    assert_eq!(StockLevel::for_quantity(10), StockLevel::LowStock);
    assert_eq!(StockLevel::for_quantity(1), StockLevel::LowStock);
    assert_eq!(StockLevel::for_quantity(0), StockLevel::OutOfStock);
  }

  #[test]
  fn query_matches_title_or_author_ignoring_case() {
    let book = sample_book("Số đỏ", "Vũ Trọng Phụng", 3);
    let by_author = BookQuery {
      search: Some("  vũ trọng ".to_string()),
      ..Default::default()
    };
    let by_title = BookQuery {
      search: Some("SỐ".to_string()),
      ..Default::default()
    };
    let miss = BookQuery {
      search: Some("Nam Cao".to_string()),
      ..Default::default()
    };
    assert!(by_author.matches(&book));
    assert!(by_title.matches(&book));
    assert!(!miss.matches(&book));
  }

  #[test]
  fn blank_search_matches_everything() {
    let query = BookQuery {
      search: Some("   ".to_string()),
      ..Default::default()
    };
    assert_eq!(query.search_term(), None);
    assert!(query.matches(&sample_book("Any", "One", 0)));
  }

  #[test]
  fn category_filter_excludes_uncategorized_books() {
    let query = BookQuery {
      category_id: Some(Uuid::new_v4()),
      ..Default::default()
    };
    assert!(!query.matches(&sample_book("Any", "One", 0)));
  }
}
