// server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  book_handlers, cart_handlers, category_handlers, customer_handlers, employee_handlers, order_handlers,
  payment_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies, query strings and path segments get the same JSON error
/// shape as domain errors.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err: error::JsonPayloadError, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
      web::QueryConfig::default()
        .error_handler(|err: error::QueryPayloadError, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|err: error::PathError, _req| AppError::Validation(err.to_string()).into()),
    );
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/categories")
          .route("", web::get().to(category_handlers::list_categories_handler))
          .route("", web::post().to(category_handlers::create_category_handler))
          .route("/{category_id}", web::get().to(category_handlers::get_category_handler))
          .route("/{category_id}", web::put().to(category_handlers::update_category_handler))
          .route("/{category_id}", web::delete().to(category_handlers::delete_category_handler)),
      )
      .service(
        web::scope("/books")
          .route("", web::get().to(book_handlers::list_books_handler))
          .route("", web::post().to(book_handlers::create_book_handler))
          .route("/{book_id}", web::get().to(book_handlers::get_book_handler))
          .route("/{book_id}", web::put().to(book_handlers::update_book_handler))
          .route("/{book_id}", web::delete().to(book_handlers::delete_book_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/count", web::get().to(cart_handlers::cart_count_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{book_id}", web::put().to(cart_handlers::update_cart_line_handler))
          .route("/items/{book_id}", web::delete().to(cart_handlers::remove_from_cart_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("/checkout", web::post().to(order_handlers::checkout_cart_handler))
          .route("/mine", web::get().to(order_handlers::my_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/status", web::patch().to(order_handlers::update_order_status_handler)),
      )
      .service(
        web::scope("/customers")
          .route("", web::get().to(customer_handlers::list_customers_handler))
          .route("", web::post().to(customer_handlers::create_customer_handler))
          .route("/{customer_id}", web::get().to(customer_handlers::get_customer_handler))
          .route("/{customer_id}", web::put().to(customer_handlers::update_customer_handler))
          .route("/{customer_id}/status", web::patch().to(customer_handlers::set_customer_status_handler)),
      )
      .service(
        web::scope("/employees")
          .route("", web::get().to(employee_handlers::list_employees_handler))
          .route("", web::post().to(employee_handlers::create_employee_handler))
          .route("/{employee_id}", web::get().to(employee_handlers::get_employee_handler))
          .route("/{employee_id}", web::put().to(employee_handlers::update_employee_handler))
          .route("/{employee_id}", web::delete().to(employee_handlers::delete_employee_handler)),
      )
      .service(
        web::scope("/payments")
          .route("/order/{order_id}", web::get().to(payment_handlers::get_payment_handler))
          .route(
            "/order/{order_id}/status",
            web::patch().to(payment_handlers::update_payment_status_handler),
          ),
      ),
  );
}
