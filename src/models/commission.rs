use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Cancelled => "cancelled",
        }
    }

    /// Paid and cancelled records never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommissionStatus::Pending)
    }
}

/// The settled platform/driver split for one order. At most one record
/// exists per `order_id`, enforced by a unique index rather than an
/// application-side check, so concurrent settlement triggers (order
/// placement, driver assignment) can never produce two rows.
///
/// Invariant: `platform_amount + driver_amount == delivery_fee` exactly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommissionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub order_id: String,
    pub driver_id: Option<String>,
    pub delivery_fee: Decimal,
    pub commission_percent: Decimal,
    pub platform_amount: Decimal,
    pub driver_amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
