mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::database::{JsonFileStore, UserRepository};

fn build_cors(config: &Config) -> Cors {
    let cors = match &config.cors_origins {
        Some(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin)),
        // Legacy front-end is served from anywhere (file://, other ports)
        None => Cors::default().allow_any_origin(),
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
            actix_web::http::header::ORIGIN,
            actix_web::http::header::HeaderName::from_static("x-requested-with"),
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    log::info!("🚀 Starting Battery Lab Service...");
    log::info!("📁 Users file: {}", config.users_file);

    let store = JsonFileStore::new(&config.users_file);
    let repo = UserRepository::new(Arc::new(store));

    // Fail fast on an unreadable users file instead of on the first login
    match repo.count().await {
        Ok(count) => log::info!("✅ User store ready ({} users)", count),
        Err(e) => {
            log::error!("❌ Cannot read users file {}: {}", config.users_file, e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    }

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let repo_data = web::Data::new(repo);
    let config_data = web::Data::new(config);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = build_cors(&config_data);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(repo_data.clone())
            .app_data(config_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestMetrics)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
