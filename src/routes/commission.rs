use actix_web::{web, HttpResponse, Responder};
use mongodb::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::middleware::auth::Claims;
use crate::routes::core_error_response;
use crate::services::commission_engine::CommissionEngine;

#[derive(Debug, Serialize, Deserialize)]
pub struct SettleInput {
    pub order_id: String,
    pub delivery_fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<Decimal>,
}

/// Settle (or re-settle) an order's commission. The checkout service calls
/// this once a fee is computed and again whenever a driver is assigned or
/// reassigned; repeated calls update the one existing record.
pub async fn settle_commission(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    input: web::Json<SettleInput>,
) -> impl Responder {
    let input = input.into_inner();
    println!(
        "Settling commission for order {} (requested by {})",
        input.order_id, claims.user_id
    );

    let engine = CommissionEngine::new(data.get_ref().clone());
    match engine
        .settle(
            &input.order_id,
            input.delivery_fee,
            input.driver_id,
            input.commission_percent,
        )
        .await
    {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => core_error_response(err),
    }
}

pub async fn get_commission(
    _claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let order_id = path.into_inner();

    let engine = CommissionEngine::new(data.get_ref().clone());
    match engine.get(&order_id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => core_error_response(err),
    }
}

/// Admin action: release the driver payout. Valid only from `pending`;
/// repeating the call on an already-paid record is a no-op.
pub async fn mark_commission_paid(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let order_id = path.into_inner();
    println!(
        "Marking commission paid for order {} (admin {})",
        order_id, claims.user_id
    );

    let engine = CommissionEngine::new(data.get_ref().clone());
    match engine.mark_paid(&order_id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => core_error_response(err),
    }
}

/// Admin action: void the commission. Same transition rules as `pay`.
pub async fn cancel_commission(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let order_id = path.into_inner();
    println!(
        "Cancelling commission for order {} (admin {})",
        order_id, claims.user_id
    );

    let engine = CommissionEngine::new(data.get_ref().clone());
    match engine.cancel(&order_id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => core_error_response(err),
    }
}
