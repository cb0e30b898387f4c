// server/src/web/handlers/mod.rs

pub mod book_handlers;
pub mod cart_handlers;
pub mod category_handlers;
pub mod customer_handlers;
pub mod employee_handlers;
pub mod order_handlers;
pub mod payment_handlers;
