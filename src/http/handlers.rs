use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::order::{ChangeOrderStatus, CreateOrder, OrderPagination, OrderStatus};
use crate::health;
use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn find_all_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderPagination>,
) -> Result<HttpResponse, ApiError> {
    let page = state.orders.find_all(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn find_one_order(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.find_one(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn change_order_status(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<StatusChange>,
) -> Result<HttpResponse, ApiError> {
    let status: OrderStatus = body.status.parse().map_err(ApiError::from)?;
    let order = state
        .orders
        .change_status(ChangeOrderStatus { id: id.into_inner(), status })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn metrics_handler(state: web::Data<AppState>) -> HttpResponse {
    match state.metrics.encode() {
        Ok(buffer) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub async fn health_handler(state: web::Data<AppState>) -> HttpResponse {
    let system = health::check_all(&state.health_checks).await;
    if system.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(system)
    } else {
        HttpResponse::Ok().json(system)
    }
}
