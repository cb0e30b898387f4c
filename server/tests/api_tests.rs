// server/tests/api_tests.rs
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use bookstore_core::{BookstoreStore, InMemoryStore, NewBook};
use bookstore_server::state::AppState;
use bookstore_server::web::configure_app_routes;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn app_state(store: &InMemoryStore) -> AppState {
  AppState::new(Arc::new(store.clone()))
}

async fn seed_book(store: &InMemoryStore, title: &str, price: i64, stock: i32) -> Uuid {
  store
    .insert_book(NewBook {
      title: title.to_string(),
      author: "Tác giả".to_string(),
      genre: None,
      description: None,
      category_id: None,
      price,
      stock_quantity: stock,
      cover_image: None,
    })
    .await
    .unwrap()
    .id
}

fn customer_header(id: Uuid) -> (&'static str, String) {
  ("X-Customer-ID", id.to_string())
}

fn as_staff(req: test::TestRequest, employee_id: Uuid, role: &str) -> test::TestRequest {
  req
    .insert_header(("X-Employee-ID", employee_id.to_string()))
    .insert_header(("X-Employee-Role", role.to_string()))
}

macro_rules! init_app {
  ($store:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new(app_state($store)))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
async fn test_health_check_responds_ok() {
  let store = InMemoryStore::new();
  let app = init_app!(&store);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_place_order_then_cancel_round_trip() {
  let store = InMemoryStore::new();
  let book_id = seed_book(&store, "A", 10_000, 5).await;
  let app = init_app!(&store);
  let me = Uuid::new_v4();

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(customer_header(me))
    .set_json(json!({ "items": [{ "bookId": book_id, "quantity": 5 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order = &body["order"];
  assert_eq!(order["total"], 50_000);
  assert_eq!(order["status"], "ChoXacNhan");
  assert_eq!(order["items"][0]["unitPrice"], 10_000);
  assert_eq!(order["payment"]["method"], "COD");
  assert_eq!(order["payment"]["status"], "pending");
  assert_eq!(order["payment"]["paidAt"], Value::Null);
  let order_id = order["id"].as_str().unwrap().to_string();

  // Sold out now.
  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(customer_header(me))
    .set_json(json!({ "items": [{ "bookId": book_id, "quantity": 1 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "InsufficientStock");
  assert_eq!(body["available"], 0);

  let cancel = || {
    test::TestRequest::patch()
      .uri(&format!("/api/v1/orders/{}/status", order_id))
      .insert_header(customer_header(me))
      .set_json(json!({ "status": "Huy" }))
      .to_request()
  };
  let body: Value = test::read_body_json(test::call_service(&app, cancel()).await).await;
  assert_eq!(body["applied"], true);
  assert_eq!(body["order"]["status"], "Huy");
  assert_eq!(store.get_book(book_id).await.unwrap().unwrap().stock_quantity, 5);

  let body: Value = test::read_body_json(test::call_service(&app, cancel()).await).await;
  assert_eq!(body["applied"], false);
  assert_eq!(store.get_book(book_id).await.unwrap().unwrap().stock_quantity, 5);
}

#[actix_web::test]
async fn test_empty_order_and_missing_identity_are_rejected() {
  let store = InMemoryStore::new();
  let app = init_app!(&store);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(customer_header(Uuid::new_v4()))
    .set_json(json!({ "items": [] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "InvalidOrder");

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .set_json(json!({ "items": [] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(customer_header(Uuid::new_v4()))
    .set_json(json!({ "items": "nope" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_cart_checkout_flow() {
  let store = InMemoryStore::new();
  let a = seed_book(&store, "A", 10_000, 3).await;
  let b = seed_book(&store, "B", 4_000, 10).await;
  let app = init_app!(&store);
  let me = Uuid::new_v4();

  for (book_id, quantity) in [(a, 2), (b, 1)] {
    let req = test::TestRequest::post()
      .uri("/api/v1/cart/items")
      .insert_header(customer_header(me))
      .set_json(json!({ "bookId": book_id, "quantity": quantity }))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
  }

  // Over the advisory limit.
  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/cart/items/{}", a))
    .insert_header(customer_header(me))
    .set_json(json!({ "quantity": 4 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

  let req = test::TestRequest::get()
    .uri("/api/v1/cart")
    .insert_header(customer_header(me))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["summary"]["totalAmount"], 24_000);
  assert_eq!(body["summary"]["totalQuantity"], 3);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders/checkout")
    .insert_header(customer_header(me))
    .set_json(json!({ "paymentMethod": "ChuyenKhoan", "note": "Giao buổi sáng" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["total"], 24_000);
  assert_eq!(body["order"]["payment"]["method"], "ChuyenKhoan");

  let req = test::TestRequest::get()
    .uri("/api/v1/cart/count")
    .insert_header(customer_header(me))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["lines"], 0);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/mine")
    .insert_header(customer_header(me))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["pagination"]["totalItems"], 1);
  assert_eq!(body["orders"][0]["itemCount"], 2);
}

#[actix_web::test]
async fn test_staff_only_endpoints_enforce_roles() {
  let store = InMemoryStore::new();
  let book_id = seed_book(&store, "A", 10_000, 5).await;
  let app = init_app!(&store);
  let customer = Uuid::new_v4();
  let clerk = Uuid::new_v4();

  let req = test::TestRequest::get()
    .uri("/api/v1/orders")
    .insert_header(customer_header(customer))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  // Clerks cannot edit the catalog.
  let req = test::TestRequest::post()
    .uri("/api/v1/books")
    .insert_header(("X-Employee-ID", clerk.to_string()))
    .insert_header(("X-Employee-Role", "NhanVien"))
    .set_json(json!({ "title": "B", "author": "X", "price": 1000, "stockQuantity": 1 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  // Staff may order on a customer's behalf.
  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-Employee-ID", clerk.to_string()))
    .insert_header(("X-Employee-Role", "NhanVien"))
    .set_json(json!({ "customerId": customer, "items": [{ "bookId": book_id, "quantity": 1 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["customerId"], customer.to_string());
  assert_eq!(body["order"]["handledBy"], clerk.to_string());
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/payments/order/{}/status", order_id))
    .insert_header(("X-Employee-ID", clerk.to_string()))
    .insert_header(("X-Employee-Role", "NhanVien"))
    .set_json(json!({ "status": "success" }))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["payment"]["status"], "success");
  assert!(body["payment"]["paidAt"].is_string());

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(customer_header(customer))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["order"]["status"], "DangXuLy");

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(customer_header(Uuid::new_v4()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_catalog_listing_and_admin_edits() {
  let store = InMemoryStore::new();
  let app = init_app!(&store);
  let admin = Uuid::new_v4().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/categories")
    .insert_header(("X-Employee-ID", admin.clone()))
    .insert_header(("X-Employee-Role", "Admin"))
    .set_json(json!({ "name": "Lịch sử" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let category_id = body["category"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/books")
    .insert_header(("X-Employee-ID", admin.clone()))
    .insert_header(("X-Employee-Role", "Admin"))
    .set_json(json!({
      "title": "Việt Nam sử lược",
      "author": "Trần Trọng Kim",
      "categoryId": category_id,
      "price": 150000,
      "stockQuantity": 4
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let book_id = body["book"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/books?search=s%E1%BB%AD&category={}&limit=5", category_id))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["pagination"]["totalItems"], 1);
  assert_eq!(body["pagination"]["itemsPerPage"], 5);
  assert_eq!(body["books"][0]["title"], "Việt Nam sử lược");

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/books/{}", book_id))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["stockLevel"], "lowStock");

  let req = test::TestRequest::get().uri("/api/v1/books/not-a-uuid").to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/books/{}", book_id))
    .insert_header(("X-Employee-ID", admin.clone()))
    .insert_header(("X-Employee-Role", "Admin"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/books/{}", book_id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "BookNotFound");
}

#[actix_web::test]
async fn test_storage_failure_surfaces_as_generic_500_and_rolls_back() {
  let store = InMemoryStore::new();
  let book_id = seed_book(&store, "A", 10_000, 5).await;
  store.fail_payment_inserts(true);
  let app = init_app!(&store);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(customer_header(Uuid::new_v4()))
    .set_json(json!({ "items": [{ "bookId": book_id, "quantity": 2 }] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "TransactionFailure");
  assert_eq!(body["error"], "The operation could not be completed");
  assert_eq!(store.get_book(book_id).await.unwrap().unwrap().stock_quantity, 5);
  assert_eq!(store.counts().await.orders, 0);
}

#[actix_web::test]
async fn test_checkout_rejects_malformed_body_and_keeps_cart() {
  let store = InMemoryStore::new();
  let book_id = seed_book(&store, "A", 10_000, 5).await;
  let app = init_app!(&store);
  let me = Uuid::new_v4();

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .insert_header(customer_header(me))
    .set_json(json!({ "bookId": book_id, "quantity": 2 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders/checkout")
    .insert_header(customer_header(me))
    .set_json(json!({ "paymentMethod": "Paypal", "note": "Giao buổi tối" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "Validation");

  assert_eq!(store.cart_lines(me).await.unwrap().len(), 1);
  assert_eq!(store.counts().await.orders, 0);
  assert_eq!(store.get_book(book_id).await.unwrap().unwrap().stock_quantity, 5);

  // No body at all still checks out with the defaults.
  let req = test::TestRequest::post()
    .uri("/api/v1/orders/checkout")
    .insert_header(customer_header(me))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["order"]["payment"]["method"], "COD");
  assert!(store.cart_lines(me).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_category_update_and_delete() {
  let store = InMemoryStore::new();
  let app = init_app!(&store);
  let manager = Uuid::new_v4();

  let mut ids = Vec::new();
  for name in ["Kinh tế", "Khoa học"] {
    let req = as_staff(test::TestRequest::post().uri("/api/v1/categories"), manager, "QuanLy")
      .set_json(json!({ "name": name }))
      .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    ids.push(body["category"]["id"].as_str().unwrap().to_string());
  }

  let req = as_staff(
    test::TestRequest::put().uri(&format!("/api/v1/categories/{}", ids[1])),
    manager,
    "QuanLy",
  )
  .set_json(json!({ "name": "kinh tế" }))
  .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "AlreadyExists");

  let req = as_staff(
    test::TestRequest::put().uri(&format!("/api/v1/categories/{}", ids[1])),
    manager,
    "QuanLy",
  )
  .set_json(json!({ "name": "Khoa học tự nhiên", "description": "Vật lý, hoá học" }))
  .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["category"]["name"], "Khoa học tự nhiên");

  let req = as_staff(
    test::TestRequest::post().uri("/api/v1/books"),
    manager,
    "QuanLy",
  )
  .set_json(json!({ "title": "Kinh tế học", "author": "X", "categoryId": ids[0], "price": 1000, "stockQuantity": 1 }))
  .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let delete = |id: &str, role: &str| {
    as_staff(
      test::TestRequest::delete().uri(&format!("/api/v1/categories/{}", id)),
      manager,
      role,
    )
    .to_request()
  };
  assert_eq!(
    test::call_service(&app, delete(&ids[1], "NhanVien")).await.status(),
    StatusCode::FORBIDDEN
  );
  let resp = test::call_service(&app, delete(&ids[0], "QuanLy")).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "CategoryInUse");
  assert_eq!(test::call_service(&app, delete(&ids[1], "QuanLy")).await.status(), StatusCode::OK);
  assert_eq!(
    test::call_service(&app, delete(&ids[1], "QuanLy")).await.status(),
    StatusCode::NOT_FOUND
  );
}

#[actix_web::test]
async fn test_customer_records_and_deactivation() {
  let store = InMemoryStore::new();
  let book_id = seed_book(&store, "A", 10_000, 5).await;
  let app = init_app!(&store);
  let manager = Uuid::new_v4();
  let shopper = Uuid::new_v4();

  let req = as_staff(test::TestRequest::post().uri("/api/v1/customers"), manager, "QuanLy")
    .set_json(json!({ "id": shopper, "fullName": "Vũ Thị Xuân", "email": "xuan@example.vn" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["customer"]["id"], shopper.to_string());
  assert_eq!(body["customer"]["active"], true);

  // A customer can read their own record but not the list.
  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/customers/{}", shopper))
    .insert_header(customer_header(shopper))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
  let req = test::TestRequest::get()
    .uri("/api/v1/customers")
    .insert_header(customer_header(shopper))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = as_staff(
    test::TestRequest::put().uri(&format!("/api/v1/customers/{}", shopper)),
    manager,
    "Admin",
  )
  .set_json(json!({ "fullName": "Vũ Thị Xuân", "email": "xuan.vu@example.vn", "phone": "0987654321" }))
  .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["customer"]["email"], "xuan.vu@example.vn");

  let set_active = |active: bool| {
    as_staff(
      test::TestRequest::patch().uri(&format!("/api/v1/customers/{}/status", shopper)),
      manager,
      "QuanLy",
    )
    .set_json(json!({ "active": active }))
    .to_request()
  };
  let body: Value = test::read_body_json(test::call_service(&app, set_active(false)).await).await;
  assert_eq!(body["customer"]["active"], false);

  let order = || {
    test::TestRequest::post()
      .uri("/api/v1/orders")
      .insert_header(customer_header(shopper))
      .set_json(json!({ "items": [{ "bookId": book_id, "quantity": 1 }] }))
      .to_request()
  };
  let resp = test::call_service(&app, order()).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "CustomerInactive");

  test::call_service(&app, set_active(true)).await;
  assert_eq!(test::call_service(&app, order()).await.status(), StatusCode::CREATED);

  let req = as_staff(
    test::TestRequest::get().uri("/api/v1/customers?search=xuan&active=true"),
    manager,
    "QuanLy",
  )
  .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["pagination"]["totalItems"], 1);
  assert_eq!(body["customers"][0]["orderCount"], 1);
  assert_eq!(body["customers"][0]["totalSpent"], 0);
}

#[actix_web::test]
async fn test_employee_records_admin_only_writes() {
  let store = InMemoryStore::new();
  let app = init_app!(&store);
  let admin = Uuid::new_v4();
  let manager = Uuid::new_v4();

  let req = as_staff(test::TestRequest::post().uri("/api/v1/employees"), manager, "QuanLy")
    .set_json(json!({ "username": "yen", "fullName": "Đỗ Hải Yến" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = as_staff(test::TestRequest::post().uri("/api/v1/employees"), admin, "Admin")
    .set_json(json!({ "username": "yen", "fullName": "Đỗ Hải Yến" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["employee"]["role"], "NhanVien");
  let yen = body["employee"]["id"].as_str().unwrap().to_string();

  let req = as_staff(test::TestRequest::get().uri("/api/v1/employees?role=NhanVien"), manager, "QuanLy")
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["pagination"]["totalItems"], 1);
  assert_eq!(body["employees"][0]["handledOrders"], 0);

  let req = as_staff(
    test::TestRequest::put().uri(&format!("/api/v1/employees/{}", yen)),
    admin,
    "Admin",
  )
  .set_json(json!({ "username": "yen.do", "fullName": "Đỗ Hải Yến", "role": "QuanLy" }))
  .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["employee"]["role"], "QuanLy");

  let req = as_staff(
    test::TestRequest::delete().uri(&format!("/api/v1/employees/{}", admin)),
    admin,
    "Admin",
  )
  .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = as_staff(
    test::TestRequest::delete().uri(&format!("/api/v1/employees/{}", yen)),
    admin,
    "Admin",
  )
  .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = as_staff(
    test::TestRequest::get().uri(&format!("/api/v1/employees/{}", yen)),
    manager,
    "QuanLy",
  )
  .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "EmployeeNotFound");
}
