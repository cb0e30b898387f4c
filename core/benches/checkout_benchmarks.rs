use bookstore_core::{
  place_order, update_order_status, Actor, BookstoreStore, InMemoryStore, NewBook, OrderItemRequest, OrderStatus,
  PlaceOrder, StaffRole, StatusChange,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use uuid::Uuid;

const BENCH_STOCK: i32 = 1_000_000_000;

fn seeded_store(rt: &Runtime, books: usize) -> (InMemoryStore, Vec<Uuid>) {
  let store = InMemoryStore::new();
  let ids = rt.block_on(async {
    let mut ids = Vec::with_capacity(books);
    for i in 0..books {
      let book = store
        .insert_book(NewBook {
          title: format!("Bench book {}", i),
          author: "Bench".to_string(),
          genre: None,
          description: None,
          category_id: None,
          price: 10_000 + i as i64,
          stock_quantity: BENCH_STOCK,
          cover_image: None,
        })
        .await
        .unwrap();
      ids.push(book.id);
    }
    ids
  });
  (store, ids)
}

fn request_for(book_ids: &[Uuid]) -> PlaceOrder {
  PlaceOrder {
    customer_id: Uuid::new_v4(),
    items: book_ids
      .iter()
      .map(|&book_id| OrderItemRequest { book_id, quantity: 1 })
      .collect(),
    ..Default::default()
  }
}

fn bench_place_order(c: &mut Criterion) {
  let mut group = c.benchmark_group("PlaceOrderInMemory");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 5, 20].iter() {
    let (store, ids) = seeded_store(&rt, *lines);
    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
      b.to_async(&rt).iter_batched(
        || request_for(&ids),
        |request| {
          let store = store.clone();
          async move { place_order(&store, request).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_place_then_cancel(c: &mut Criterion) {
  let mut group = c.benchmark_group("PlaceThenCancelInMemory");
  let rt = Runtime::new().unwrap();
  let (store, ids) = seeded_store(&rt, 5);
  let staff = Actor::Staff {
    employee_id: Uuid::new_v4(),
    role: StaffRole::Clerk,
  };

  group.bench_function("5_lines", |b| {
    b.to_async(&rt).iter_batched(
      || request_for(&ids),
      |request| {
        let store = store.clone();
        async move {
          let detail = place_order(&store, request).await.unwrap();
          update_order_status(
            &store,
            StatusChange {
              order_id: detail.order.id,
              target: OrderStatus::Cancelled,
              actor: staff,
            },
          )
          .await
          .unwrap()
        }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

criterion_group!(benches, bench_place_order, bench_place_then_cancel);
criterion_main!(benches);
