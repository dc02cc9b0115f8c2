use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use hrm_sync::{AppContext, Config, MemoryBlobStore, MemoryStore};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;

mod api;
mod auth;
mod docs;
mod routes;

use crate::docs::ApiDoc;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[get("/api-doc/openapi.json")]
async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    // In-process adapters; a hosted document store plugs in behind the same traits.
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = AppContext::new(store, blobs, config.policy.clone());

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .app_data(Data::new(ctx.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .service(openapi_json)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .inspect_err(|e| error!(addr = %server_addr, error = %e, "Failed to bind"))?
    .run()
    .await
}
