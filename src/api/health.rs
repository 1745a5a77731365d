use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use crate::database::UserRepository;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub users: Option<usize>,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "User store unreadable", body = HealthResponse)
    )
)]
pub async fn health_check(repo: web::Data<UserRepository>) -> impl Responder {
    let users = match repo.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            log::error!("❌ Health check: user store unreadable - {}", e);
            None
        }
    };

    let body = HealthResponse {
        status: if users.is_some() { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users,
        timestamp: chrono::Utc::now().timestamp(),
    };

    if users.is_some() {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
