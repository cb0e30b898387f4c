// core/src/catalog.rs

//! Categories and books.

use crate::access::Actor;
use crate::error::{BookstoreError, Result};
use crate::model::{Book, BookChanges, BookQuery, Category, NewBook, NewCategory};
use crate::pagination::Page;
use crate::store::{BookstoreStore, StoreTx};
use tracing::{error, info, instrument, warn};
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

/// Trims text fields and checks the numeric ones.
fn validate_book(input: NewBook) -> Result<NewBook> {
  if input.price < 0 {
    return Err(BookstoreError::Validation("price must not be negative".to_string()));
  }
  if input.stock_quantity < 0 {
    return Err(BookstoreError::Validation("stockQuantity must not be negative".to_string()));
  }
  Ok(NewBook {
    title: required("title", &input.title)?,
    author: required("author", &input.author)?,
    genre: optional(input.genre),
    description: optional(input.description),
    category_id: input.category_id,
    price: input.price,
    stock_quantity: input.stock_quantity,
    cover_image: optional(input.cover_image),
  })
}

async fn ensure_category(store: &dyn BookstoreStore, category_id: Option<Uuid>) -> Result<()> {
  if let Some(category_id) = category_id {
    if store.get_category(category_id).await?.is_none() {
      return Err(BookstoreError::CategoryNotFound { category_id });
    }
  }
  Ok(())
}

fn validate_category(input: NewCategory) -> Result<NewCategory> {
  Ok(NewCategory {
    name: required("name", &input.name)?,
    description: optional(input.description),
  })
}

/// Category names are unique, ignoring case.
async fn ensure_category_name_free(store: &dyn BookstoreStore, name: &str, own_id: Option<Uuid>) -> Result<()> {
  let wanted = name.to_lowercase();
  let taken = store
    .list_categories()
    .await?
    .into_iter()
    .any(|category| Some(category.id) != own_id && category.name.to_lowercase() == wanted);
  if taken {
    return Err(BookstoreError::AlreadyExists(format!("Category name '{}'", name)));
  }
  Ok(())
}

/// Commits a successful outcome, rolls back a failed one.
async fn settle<T>(tx: Box<dyn StoreTx>, outcome: Result<T>, operation: &str) -> Result<T> {
  match outcome {
    Ok(value) => {
      tx.commit().await?;
      Ok(value)
    }
    Err(err) => {
      warn!("{} rejected: {}", operation, err);
      if let Err(rollback_err) = tx.rollback().await {
        error!("{} rollback failed: {}", operation, rollback_err);
      }
      Err(err)
    }
  }
}

#[instrument(name = "catalog::list_categories", skip(store))]
pub async fn list_categories(store: &dyn BookstoreStore) -> Result<Vec<Category>> {
  Ok(store.list_categories().await?)
}

#[instrument(name = "catalog::get_category", skip(store))]
pub async fn get_category(store: &dyn BookstoreStore, category_id: Uuid) -> Result<Category> {
  store
    .get_category(category_id)
    .await?
    .ok_or(BookstoreError::CategoryNotFound { category_id })
}

#[instrument(name = "catalog::create_category", skip(store, actor, input))]
pub async fn create_category(store: &dyn BookstoreStore, actor: &Actor, input: NewCategory) -> Result<Category> {
  actor.ensure_catalog_editor()?;
  let input = validate_category(input)?;
  ensure_category_name_free(store, &input.name, None).await?;
  let category = store.insert_category(input).await?;
  info!("Category {} '{}' created.", category.id, category.name);
  Ok(category)
}

#[instrument(name = "catalog::update_category", skip(store, actor, changes))]
pub async fn update_category(
  store: &dyn BookstoreStore,
  actor: &Actor,
  category_id: Uuid,
  changes: NewCategory,
) -> Result<Category> {
  actor.ensure_catalog_editor()?;
  let changes = validate_category(changes)?;
  ensure_category_name_free(store, &changes.name, Some(category_id)).await?;
  let category = store
    .update_category(category_id, changes)
    .await?
    .ok_or(BookstoreError::CategoryNotFound { category_id })?;
  info!("Category {} renamed to '{}'.", category.id, category.name);
  Ok(category)
}

async fn remove_category(tx: &mut dyn StoreTx, category_id: Uuid) -> Result<()> {
  if tx.lock_category(category_id).await?.is_none() {
    return Err(BookstoreError::CategoryNotFound { category_id });
  }
  if tx.category_has_books(category_id).await? {
    return Err(BookstoreError::CategoryInUse { category_id });
  }
  tx.delete_category(category_id).await?;
  Ok(())
}

/// Deletes a category no book belongs to.
#[instrument(name = "catalog::delete_category", skip(store, actor))]
pub async fn delete_category(store: &dyn BookstoreStore, actor: &Actor, category_id: Uuid) -> Result<()> {
  actor.ensure_catalog_editor()?;
  let mut tx = store.begin().await?;
  let outcome = remove_category(tx.as_mut(), category_id).await;
  settle(tx, outcome, "Category delete").await?;
  info!("Category {} deleted.", category_id);
  Ok(())
}

#[instrument(name = "catalog::list_books", skip(store))]
pub async fn list_books(store: &dyn BookstoreStore, query: BookQuery) -> Result<Page<Book>> {
  Ok(store.list_books(&query).await?)
}

#[instrument(name = "catalog::get_book", skip(store))]
pub async fn get_book(store: &dyn BookstoreStore, book_id: Uuid) -> Result<Book> {
  store
    .get_book(book_id)
    .await?
    .ok_or(BookstoreError::BookNotFound { book_id })
}

#[instrument(name = "catalog::create_book", skip(store, actor, input))]
pub async fn create_book(store: &dyn BookstoreStore, actor: &Actor, input: NewBook) -> Result<Book> {
  actor.ensure_catalog_editor()?;
  let input = validate_book(input)?;
  ensure_category(store, input.category_id).await?;
  let book = store.insert_book(input).await?;
  info!("Book {} '{}' created with {} in stock.", book.id, book.title, book.stock_quantity);
  Ok(book)
}

#[instrument(name = "catalog::update_book", skip(store, actor, changes))]
pub async fn update_book(store: &dyn BookstoreStore, actor: &Actor, book_id: Uuid, changes: BookChanges) -> Result<Book> {
  actor.ensure_catalog_editor()?;
  let changes = validate_book(changes)?;
  ensure_category(store, changes.category_id).await?;
  let book = store
    .update_book(book_id, changes)
    .await?
    .ok_or(BookstoreError::BookNotFound { book_id })?;
  info!("Book {} updated.", book.id);
  Ok(book)
}

/// The row lock keeps checkouts of this book out until the delete settles.
async fn remove_book(tx: &mut dyn StoreTx, book_id: Uuid) -> Result<()> {
  if tx.lock_book(book_id).await?.is_none() {
    return Err(BookstoreError::BookNotFound { book_id });
  }
  if tx.book_has_order_lines(book_id).await? {
    return Err(BookstoreError::BookInUse { book_id });
  }
  tx.delete_book(book_id).await?;
  Ok(())
}

/// Deletes a book no order refers to. Cart lines for it go with it.
#[instrument(name = "catalog::delete_book", skip(store, actor))]
pub async fn delete_book(store: &dyn BookstoreStore, actor: &Actor, book_id: Uuid) -> Result<()> {
  actor.ensure_catalog_editor()?;
  let mut tx = store.begin().await?;
  let outcome = remove_book(tx.as_mut(), book_id).await;
  settle(tx, outcome, "Book delete").await?;
  info!("Book {} deleted.", book_id);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_name_is_required() {
    let blank = NewCategory {
      name: "  ".to_string(),
      description: Some("x".to_string()),
    };
    assert!(matches!(validate_category(blank), Err(BookstoreError::Validation(_))));
  }

  fn input(title: &str, price: i64, stock: i32) -> NewBook {
    NewBook {
      title: title.to_string(),
      author: "Nguyễn Nhật Ánh".to_string(),
      genre: Some("  ".to_string()),
      description: None,
      category_id: None,
      price,
      stock_quantity: stock,
      cover_image: None,
    }
  }

  #[test]
  fn book_text_is_trimmed_and_blank_optionals_dropped() {
    let book = validate_book(input("  Mắt biếc ", 95_000, 3)).unwrap();
    assert_eq!(book.title, "Mắt biếc");
    assert_eq!(book.genre, None);
  }

  #[test]
  fn book_rejects_blank_title_and_negative_numbers() {
    assert!(matches!(validate_book(input(" ", 1, 1)), Err(BookstoreError::Validation(_))));
    assert!(matches!(validate_book(input("A", -1, 1)), Err(BookstoreError::Validation(_))));
    assert!(matches!(validate_book(input("A", 1, -1)), Err(BookstoreError::Validation(_))));
  }
}
