// server/src/db/seed.rs

//! Demo catalog for local development.

use bookstore_core::{BookQuery, BookstoreStore, NewBook, NewCategory};
use tracing::info;

struct SeedBook {
  title: &'static str,
  author: &'static str,
  genre: &'static str,
  price: i64,
  stock: i32,
}

const SEED_CATALOG: &[(&str, &str, &[SeedBook])] = &[
  (
    "Văn học Việt Nam",
    "Tiểu thuyết và truyện ngắn trong nước",
    &[
      SeedBook {
        title: "Số đỏ",
        author: "Vũ Trọng Phụng",
        genre: "Tiểu thuyết",
        price: 68_000,
        stock: 25,
      },
      SeedBook {
        title: "Tắt đèn",
        author: "Ngô Tất Tố",
        genre: "Tiểu thuyết",
        price: 54_000,
        stock: 8,
      },
      SeedBook {
        title: "Chí Phèo",
        author: "Nam Cao",
        genre: "Truyện ngắn",
        price: 45_000,
        stock: 0,
      },
    ],
  ),
  (
    "Thiếu nhi",
    "Sách cho bạn đọc nhỏ tuổi",
    &[
      SeedBook {
        title: "Dế Mèn phiêu lưu ký",
        author: "Tô Hoài",
        genre: "Phiêu lưu",
        price: 52_000,
        stock: 40,
      },
      SeedBook {
        title: "Kính vạn hoa - Tập 1",
        author: "Nguyễn Nhật Ánh",
        genre: "Học đường",
        price: 35_000,
        stock: 12,
      },
    ],
  ),
];

/// Inserts the demo catalog unless the store already holds books.
/// Returns the number of books inserted.
pub async fn seed_catalog(store: &dyn BookstoreStore) -> anyhow::Result<usize> {
  let existing = store.list_books(&BookQuery::default()).await?;
  if existing.pagination.total_items > 0 {
    info!(
      "Catalog already has {} book(s); skipping seed.",
      existing.pagination.total_items
    );
    return Ok(0);
  }

  let mut inserted = 0;
  for (category_name, category_description, books) in SEED_CATALOG {
    let category = store
      .insert_category(NewCategory {
        name: category_name.to_string(),
        description: Some(category_description.to_string()),
      })
      .await?;
    for seed in books.iter() {
      store
        .insert_book(NewBook {
          title: seed.title.to_string(),
          author: seed.author.to_string(),
          genre: Some(seed.genre.to_string()),
          description: None,
          category_id: Some(category.id),
          price: seed.price,
          stock_quantity: seed.stock,
          cover_image: None,
        })
        .await?;
      inserted += 1;
    }
  }
  info!("Seeded {} book(s) across {} categories.", inserted, SEED_CATALOG.len());
  Ok(inserted)
}
