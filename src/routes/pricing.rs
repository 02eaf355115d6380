use actix_web::{web, HttpResponse, Responder};
use mongodb::Client;
use serde::Serialize;
use std::sync::Arc;

use crate::models::order::OrderContext;
use crate::models::pricing::{PricingConfig, TimeSlot, Zone};
use crate::routes::core_error_response;
use crate::services::fee_calculator::FeeCalculator;
use crate::services::pricing_service::PricingService;

/// Quote the delivery fee for an order. Invoked by the checkout service
/// before payment; a 503 here is meant to block checkout until an active
/// pricing config is published.
pub async fn get_quote(
    data: web::Data<Arc<Client>>,
    input: web::Json<OrderContext>,
) -> impl Responder {
    let ctx = input.into_inner();
    println!("Quoting delivery fee for order {}", ctx.order_id);

    let pricing = PricingService::new(data.get_ref().clone());
    let snapshot = match pricing.load_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => return core_error_response(err),
    };

    match FeeCalculator::compute(&ctx, &snapshot) {
        Ok(breakdown) => HttpResponse::Ok().json(breakdown),
        Err(err) => core_error_response(err),
    }
}

#[derive(Serialize)]
struct ActivePricingResponse {
    config: PricingConfig,
    time_slots: Vec<TimeSlot>,
    zones: Vec<Zone>,
}

/// Read-only view of the published pricing state, for ops and the admin
/// dashboard. Editing happens elsewhere.
pub async fn get_active_pricing(data: web::Data<Arc<Client>>) -> impl Responder {
    let pricing = PricingService::new(data.get_ref().clone());

    let snapshot = match pricing.load_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => return core_error_response(err),
    };

    match snapshot.config {
        Some(config) if config.is_active => HttpResponse::Ok().json(ActivePricingResponse {
            config,
            time_slots: snapshot.time_slots,
            zones: snapshot.zones,
        }),
        _ => core_error_response(crate::errors::CoreError::ConfigInactive),
    }
}
