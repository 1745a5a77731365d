use actix_web::{web, HttpResponse, ResponseError};
use crate::{config::Config, services::prediction_service};
use crate::models::{PredictionRequest, PredictionResponse};

#[utoipa::path(
    post,
    path = "/api/early-life-prediction",
    tag = "Prediction",
    request_body = PredictionRequest,
    responses(
        (status = 200, description = "Per-row cycle life estimates and summary", body = PredictionResponse),
        (status = 400, description = "No data provided")
    )
)]
pub async fn early_life_prediction(
    config: web::Data<Config>,
    request: web::Json<PredictionRequest>,
) -> HttpResponse {
    let rows = request.into_inner().data;
    log::info!("🔋 POST /api/early-life-prediction - {} rows", rows.len());

    match prediction_service::predict(rows, config.prediction_batch_size).await {
        Ok(response) => {
            log::info!(
                "✅ Prediction done: {} samples, average {} cycles",
                response.summary.total_samples,
                response.summary.average_cycle_life
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Prediction failed: {}", e);
            e.error_response()
        }
    }
}
