use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order facts supplied by the checkout service when requesting a quote.
/// Distance and stop count arrive pre-computed; this service does no
/// geocoding or routing of its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderContext {
    pub order_id: String,
    pub subtotal: Decimal,
    pub distance_km: Decimal,
    pub stop_count: u32,
    pub placed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}
