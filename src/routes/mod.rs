use actix_web::HttpResponse;
use serde_json::json;

use crate::errors::CoreError;

pub mod commission;
pub mod health;
pub mod pricing;
pub mod stats;

/// Map a service error onto the HTTP surface. Validation and configuration
/// problems get distinct messages because they need different operator
/// responses: fix one field vs publish an active config.
pub fn core_error_response(err: CoreError) -> HttpResponse {
    match err {
        CoreError::Validation { field, message } => {
            HttpResponse::BadRequest().json(json!({ "error": message, "field": field }))
        }
        CoreError::ConfigInactive => HttpResponse::ServiceUnavailable().json(json!({
            "error": "No active pricing configuration is published. Publish a config before requesting quotes."
        })),
        CoreError::CommissionFinalized { order_id } => HttpResponse::Conflict().json(json!({
            "error": format!("Commission for order {} is finalized and can no longer change", order_id)
        })),
        CoreError::NotFound { entity } => {
            HttpResponse::NotFound().json(json!({ "error": format!("{} not found", entity) }))
        }
        CoreError::Persistence(err) => {
            eprintln!("Storage error: {:?}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Storage error, please retry" }))
        }
    }
}
