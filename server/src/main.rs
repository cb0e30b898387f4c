// server/src/main.rs

use bookstore_server::config::{AppConfig, LogFormat};
use bookstore_server::db::{self, seed, PgStore};
use bookstore_server::state::AppState;
use bookstore_server::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

/// Connects, migrates and seeds; everything the server needs before binding.
async fn bootstrap(config: &AppConfig) -> anyhow::Result<AppState> {
  let pool = db::connect(config).await.context("connecting to the database")?;
  if config.run_migrations {
    db::run_migrations(&pool).await.context("running migrations")?;
  }

  let store = PgStore::new(pool);
  if config.seed_db {
    let inserted = seed::seed_catalog(&store).await.context("seeding the demo catalog")?;
    tracing::info!("Database seeding finished ({} book(s) inserted).", inserted);
  }

  Ok(AppState::new(Arc::new(store)))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Configuration decides the log format, so it is read before logging exists.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!("Starting bookstore server...");

  let app_state = match bootstrap(&app_config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = ?e, "Server startup failed.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)));
    }
  };

  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
