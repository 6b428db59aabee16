// ============================================================================
// Inbound HTTP Surface (actix-web)
// ============================================================================
//
// POST  /orders        create
// GET   /orders        paginated listing (?page, ?limit, ?status)
// GET   /orders/{id}   single order with product names
// PATCH /orders/{id}   status change
// GET   /metrics       prometheus text format
// GET   /health        component health
//
// ============================================================================

mod error;
mod handlers;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use crate::domain::order::OrderService;
use crate::health::HealthCheckable;
use crate::metrics::Metrics;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

/// Routes plus extractor configs that turn malformed input into 400 `ApiError`s
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into()),
    )
    .service(
        web::resource("/orders")
            .route(web::post().to(handlers::create_order))
            .route(web::get().to(handlers::find_all_orders)),
    )
    .service(
        web::resource("/orders/{id}")
            .route(web::get().to(handlers::find_one_order))
            .route(web::patch().to(handlers::change_order_status)),
    )
    .route("/metrics", web::get().to(handlers::metrics_handler))
    .route("/health", web::get().to(handlers::health_handler));
}

/// Serve until the server is stopped (ctrl-c / SIGTERM).
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(state);
    tracing::info!("Starting HTTP server on http://0.0.0.0:{}", port);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::domain::order::TransitionPolicy;
    use crate::health::StoreHealth;
    use crate::messaging::stub::StaticProducts;
    use crate::persistence::InMemoryOrderRepository;

    fn state() -> AppState {
        let repository = Arc::new(InMemoryOrderRepository::new());
        let products = Arc::new(StaticProducts::with(&[(1, "Keyboard", "5.0"), (2, "Mouse", "3.0")]));
        let metrics = Arc::new(Metrics::new().unwrap());
        let orders = Arc::new(OrderService::new(
            repository.clone(),
            products,
            TransitionPolicy::default(),
            metrics.clone(),
        ));

        AppState {
            orders,
            metrics,
            health_checks: vec![Arc::new(StoreHealth::new(repository))],
        }
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(web::Data::new(state())).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_create_and_fetch_order() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": [{ "productId": 1, "quantity": 2 }, { "productId": 2, "quantity": 1 }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["totalAmount"], "13.0");
        assert_eq!(created["totalItems"], 3);
        assert_eq!(created["status"], "PENDING");
        assert_eq!(created["items"][0]["name"], "Keyboard");

        let id = created["id"].as_str().unwrap();
        let req = test::TestRequest::get().uri(&format!("/orders/{id}")).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found, created);
    }

    #[actix_web::test]
    async fn test_unknown_product_is_bad_request() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": [{ "productId": 42, "quantity": 1 }] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
        assert!(body["message"].as_str().unwrap().contains("42"));
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": "lots" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_order_is_not_found() {
        let app = app!();
        let id = uuid::Uuid::new_v4();

        let req = test::TestRequest::get().uri(&format!("/orders/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], format!("Order with id:{id} not found"));
    }

    #[actix_web::test]
    async fn test_non_uuid_path_is_bad_request() {
        let app = app!();

        let req = test::TestRequest::get().uri("/orders/not-a-uuid").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_change_status() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": [{ "productId": 1, "quantity": 1 }] }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_str().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{id}"))
            .set_json(json!({ "status": "paid" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "PAID");
        assert_eq!(updated["paid"], false);

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{id}"))
            .set_json(json!({ "status": "SHIPPED" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_listing_with_pagination_meta() {
        let app = app!();

        for _ in 0..3 {
            let req = test::TestRequest::post()
                .uri("/orders")
                .set_json(json!({ "items": [{ "productId": 2, "quantity": 1 }] }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get().uri("/orders?page=2&limit=2").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["meta"], json!({ "total": 3, "current_page": 2, "last_page": 2 }));

        let req = test::TestRequest::get().uri("/orders?limit=0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/orders?status=pending").to_request();
        let pending: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending["meta"]["total"], 3);

        let req = test::TestRequest::get().uri("/orders?status=LOST").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_metrics_and_health() {
        let app = app!();

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["status"], "healthy");

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("circuit_breaker_state"));
    }
}
