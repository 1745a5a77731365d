pub mod auth;
pub mod health;
pub mod metrics;
pub mod prediction;
pub mod swagger;
pub mod users;

use actix_web::{error::InternalError, web, HttpResponse};

/// Upload limit for prediction batches (CSV files of a few MB)
const JSON_LIMIT: usize = 16 * 1024 * 1024;

/// Malformed JSON bodies answer with the same `{success, message}` shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("❌ Rejected request body: {}", err);
            let response = HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "message": format!("Invalid request body: {}", err)
            }));
            InternalError::from_response(err, response).into()
        })
}

/// Registers every route the front-end talks to
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        .service(
            web::scope("/api")
                // Auth endpoints
                .route("/login", web::post().to(auth::login))
                .route("/register", web::post().to(auth::register))
                .route("/forgot", web::post().to(auth::forgot_password))
                .route("/reset-password", web::post().to(auth::reset_password))
                .route("/verify", web::post().to(auth::verify_email))
                .route("/auth/verify", web::get().to(auth::verify_token))
                // Profile
                .route("/user/{email}", web::get().to(users::get_user))
                .route("/user/{email}", web::put().to(users::update_user))
                // Prediction
                .route("/early-life-prediction", web::post().to(prediction::early_life_prediction)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::{MemoryStore, UserRepository};
    use crate::middleware::{RequestMetrics, SecurityHeaders};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            bcrypt_cost: 4,
            prediction_batch_size: 2,
            ..Config::default()
        }
    }

    macro_rules! test_app {
        ($repo:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($repo.clone()))
                    .app_data(web::Data::new(test_config()))
                    .wrap(SecurityHeaders)
                    .wrap(RequestMetrics)
                    .configure(configure),
            )
            .await
        };
    }

    fn repo() -> UserRepository {
        UserRepository::new(Arc::new(MemoryStore::default()))
    }

    macro_rules! post {
        ($app:expr, $uri:expr, $body:expr $(,)?) => {{
            let req = test::TestRequest::post().uri($uri).set_json($body).to_request();
            let res = test::call_service(&$app, req).await;
            let status = res.status();
            let body: Value = test::read_body_json(res).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_account_lifecycle() {
        let repo = repo();
        let app = test_app!(repo);

        let (status, body) = post!(
            app,
            "/api/register",
            json!({ "lastName": "Zhang", "firstName": "San", "email": "zs@example.com", "password": "Test1234" }),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = post!(
            app,
            "/api/login",
            json!({ "email": "zs@example.com", "password": "Test1234" }),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email not verified, please check your inbox");

        let (status, _) = post!(
            app,
            "/api/verify",
            json!({ "email": "zs@example.com", "code": "123456" }),
        );
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post!(
            app,
            "/api/login",
            json!({ "email": "zs@example.com", "password": "Test1234" }),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["firstName"], "San");
        assert_eq!(body["user"]["email"], "zs@example.com");
        let token = body["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/auth/verify")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["email"], "zs@example.com");
    }

    #[actix_web::test]
    async fn test_duplicate_registration() {
        let repo = repo();
        let app = test_app!(repo);
        let body = json!({ "lastName": "A", "firstName": "B", "email": "dup@example.com", "password": "x" });

        let (status, _) = post!(app, "/api/register", body.clone());
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post!(app, "/api/register", body);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already registered");
    }

    #[actix_web::test]
    async fn test_missing_fields_and_bad_json() {
        let repo = repo();
        let app = test_app!(repo);

        let (status, body) = post!(app, "/api/register", json!({ "email": "a@example.com" }));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Incomplete information");

        let req = test::TestRequest::post()
            .uri("/api/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{ not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_forgot_and_reset_password() {
        let repo = repo();
        let app = test_app!(repo);
        post!(
            app,
            "/api/register",
            json!({ "lastName": "A", "firstName": "B", "email": "r@example.com", "password": "old" }),
        );

        let (status, _) = post!(app, "/api/forgot", json!({ "email": "r@example.com" }));
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post!(app, "/api/forgot", json!({ "email": "ghost@example.com" }));
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post!(
            app,
            "/api/reset-password",
            json!({ "email": "r@example.com", "code": "WRONG1", "newPassword": "new" }),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid verification code");

        let code = repo
            .find_by_email("r@example.com")
            .await
            .unwrap()
            .unwrap()
            .reset_code
            .unwrap();
        let (status, body) = post!(
            app,
            "/api/reset-password",
            json!({ "email": "r@example.com", "code": code, "newPassword": "new" }),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset successful");
    }

    #[actix_web::test]
    async fn test_profile_read_and_update() {
        let repo = repo();
        let app = test_app!(repo);
        post!(
            app,
            "/api/register",
            json!({ "lastName": "Zhang", "firstName": "San", "email": "p@example.com", "password": "pw" }),
        );

        let req = test::TestRequest::get().uri("/api/user/p@example.com").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get("x-content-type-options").unwrap().to_str().unwrap(),
            "nosniff"
        );
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["firstName"], "San");
        assert!(body.get("password").is_none());
        assert!(body.get("resetCode").is_none());

        let req = test::TestRequest::put()
            .uri("/api/user/p@example.com")
            .set_json(json!({ "firstName": "Si", "lastName": "" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["user"]["firstName"], "Si");
        assert_eq!(body["user"]["lastName"], "Zhang");

        let req = test::TestRequest::get().uri("/api/user/ghost@example.com").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_early_life_prediction_route() {
        let repo = repo();
        let app = test_app!(repo);

        let (status, body) = post!(
            app,
            "/api/early-life-prediction",
            json!({ "data": [
                { "Barcode": "BAT001", "Cycle": "5", "Capacity": "0.985", "Voltage": "3.65", "Temperature": "25.2" },
                { "Barcode": "BAT002", "current": 3.0, "cycle_id": 150, "time": 20000 },
                { "voltage": "4.2" }
            ] }),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["summary"]["totalSamples"], 3);
        assert_eq!(body["summary"]["batchCount"], 2);
        assert_eq!(body["results"][0]["cycleLife"], 540);
        assert_eq!(body["results"][0]["features"]["cycle"], 5.0);
        assert_eq!(body["results"][1]["cycleLife"], 260);
        assert_eq!(body["results"][2]["barcode"], "CELL-3");

        let (status, body) = post!(app, "/api/early-life-prediction", json!({ "data": [] }));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No data provided");
    }

    #[actix_web::test]
    async fn test_health_and_metrics() {
        let repo = repo();
        let app = test_app!(repo);

        let req = test::TestRequest::get().uri("/health").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["users"], 0);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let text = test::read_body(res).await;
        assert!(std::str::from_utf8(&text).unwrap().contains("http_requests_total"));
    }
}
