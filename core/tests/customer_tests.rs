// tests/customer_tests.rs
mod common;
use bookstore_core::customers::{create_customer, get_customer, list_customers, set_customer_active, update_customer};
use bookstore_core::{
  update_order_status, BookstoreError, CustomerChanges, CustomerQuery, NewCustomer, OrderStatus, PageRequest,
  StatusChange,
};
use common::*;
use uuid::Uuid;

fn profile(id: Option<Uuid>, name: &str, email: &str) -> NewCustomer {
  NewCustomer {
    id,
    full_name: name.to_string(),
    email: email.to_string(),
    phone: None,
    address: None,
  }
}

#[tokio::test]
async fn test_managers_create_and_update_profiles() {
  let store = new_store();
  let id = Uuid::new_v4();
  let created = create_customer(&store, &manager(), profile(Some(id), " Phạm Thu Hà ", "ha@example.vn"))
    .await
    .unwrap();
  assert_eq!(created.id, id);
  assert_eq!(created.full_name, "Phạm Thu Hà");
  assert!(created.active);

  let updated = update_customer(
    &store,
    &admin(),
    id,
    CustomerChanges {
      full_name: "Phạm Thu Hà".to_string(),
      email: "HA@example.vn".to_string(),
      phone: Some(" 0912 345 678 ".to_string()),
      address: Some("  ".to_string()),
    },
  )
  .await
  .unwrap();
  assert_eq!(updated.email, "HA@example.vn");
  assert_eq!(updated.phone.as_deref(), Some("0912 345 678"));
  assert_eq!(updated.address, None);
  assert_eq!(updated.registered_at, created.registered_at);

  assert!(matches!(
    update_customer(
      &store,
      &admin(),
      Uuid::new_v4(),
      CustomerChanges {
        full_name: "X".to_string(),
        email: "x@example.vn".to_string(),
        phone: None,
        address: None,
      },
    )
    .await,
    Err(BookstoreError::CustomerNotFound { .. })
  ));
}

#[tokio::test]
async fn test_emails_and_ids_are_unique() {
  let store = new_store();
  let id = Uuid::new_v4();
  create_customer(&store, &admin(), profile(Some(id), "An", "an@example.vn")).await.unwrap();
  let other = create_customer(&store, &admin(), profile(None, "Bảo", "bao@example.vn")).await.unwrap();

  assert!(matches!(
    create_customer(&store, &admin(), profile(None, "An 2", "AN@example.vn")).await,
    Err(BookstoreError::AlreadyExists(_))
  ));
  assert!(matches!(
    create_customer(&store, &admin(), profile(Some(id), "An 3", "an3@example.vn")).await,
    Err(BookstoreError::AlreadyExists(_))
  ));
  assert!(matches!(
    update_customer(
      &store,
      &admin(),
      other.id,
      CustomerChanges {
        full_name: "Bảo".to_string(),
        email: "an@example.vn".to_string(),
        phone: None,
        address: None,
      },
    )
    .await,
    Err(BookstoreError::AlreadyExists(_))
  ));
  assert!(matches!(
    create_customer(&store, &admin(), profile(None, "", "c@example.vn")).await,
    Err(BookstoreError::Validation(_))
  ));
  assert!(matches!(
    create_customer(&store, &admin(), profile(None, "Cúc", "not-an-email")).await,
    Err(BookstoreError::Validation(_))
  ));
}

#[tokio::test]
async fn test_only_managers_or_the_customer_see_a_profile() {
  let store = new_store();
  let me = Uuid::new_v4();
  create_customer(&store, &admin(), profile(Some(me), "Dũng", "dung@example.vn")).await.unwrap();

  assert_eq!(get_customer(&store, &customer(me), me).await.unwrap().id, me);
  assert_eq!(get_customer(&store, &manager(), me).await.unwrap().id, me);
  for outsider in [customer(Uuid::new_v4()), clerk()] {
    assert!(matches!(
      get_customer(&store, &outsider, me).await,
      Err(BookstoreError::Forbidden(_))
    ));
  }
  assert!(matches!(
    create_customer(&store, &clerk(), profile(None, "E", "e@example.vn")).await,
    Err(BookstoreError::Forbidden(_))
  ));
  assert!(matches!(
    set_customer_active(&store, &customer(me), me, false).await,
    Err(BookstoreError::Forbidden(_))
  ));
  assert!(matches!(
    list_customers(&store, &clerk(), CustomerQuery::default()).await,
    Err(BookstoreError::Forbidden(_))
  ));
  assert!(matches!(
    get_customer(&store, &admin(), Uuid::new_v4()).await,
    Err(BookstoreError::CustomerNotFound { .. })
  ));
}

#[tokio::test]
async fn test_listing_filters_and_reports_spending() {
  let store = new_store();
  let book = seed_book(&store, "A", 10_000, 50).await;
  let loyal = Uuid::new_v4();
  create_customer(&store, &admin(), profile(Some(loyal), "Giang", "giang@example.vn")).await.unwrap();
  let dormant = create_customer(&store, &admin(), profile(None, "Hùng", "hung@example.vn")).await.unwrap();
  set_customer_active(&store, &admin(), dormant.id, false).await.unwrap();

  let completed = order(&store, loyal, &[(book.id, 3)]).await.unwrap();
  order(&store, loyal, &[(book.id, 1)]).await.unwrap();
  let staff = clerk();
  for target in [OrderStatus::Processing, OrderStatus::Shipping, OrderStatus::Completed] {
    update_order_status(
      &store,
      StatusChange {
        order_id: completed.order.id,
        target,
        actor: staff,
      },
    )
    .await
    .unwrap();
  }

  let all = list_customers(&store, &manager(), CustomerQuery::default()).await.unwrap();
  assert_eq!(all.pagination.total_items, 2);
  let giang = all.items.iter().find(|s| s.customer.id == loyal).unwrap();
  assert_eq!(giang.order_count, 2);
  assert_eq!(giang.total_spent, 30_000);

  let inactive = list_customers(
    &store,
    &manager(),
    CustomerQuery {
      active: Some(false),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(inactive.items.len(), 1);
  assert_eq!(inactive.items[0].customer.id, dormant.id);
  assert_eq!(inactive.items[0].order_count, 0);

  let searched = list_customers(
    &store,
    &manager(),
    CustomerQuery {
      search: Some("GIANG@".to_string()),
      page: PageRequest::new(Some(1), Some(10)),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(searched.items.len(), 1);
  assert_eq!(searched.items[0].customer.id, loyal);
}
