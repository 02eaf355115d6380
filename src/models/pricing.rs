use chrono::{NaiveDate, NaiveTime};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Base delivery pricing parameters. Owned and edited by the admin
/// dashboard; this service only ever reads the single active document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub base_fee: Decimal,
    pub price_per_km: Decimal,
    pub free_delivery_threshold: Decimal,
    pub max_free_distance_km: Decimal,
    pub remote_zone_fee: Decimal,
    pub remote_zone_distance_km: Decimal,
    pub multi_stop_fee: Decimal,
    pub rush_hour_multiplier: Decimal,
    pub weekend_multiplier: Decimal,
    pub holiday_multiplier: Decimal,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// A named time-of-day window with a fee multiplier, e.g. a lunch rush.
/// Windows are stored as "HH:MM" strings and may wrap past midnight.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeSlot {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub multiplier: Decimal,
    pub is_active: bool,
}

impl TimeSlot {
    /// Whether this slot's window covers the given time of day. The start
    /// bound is inclusive and the end bound exclusive; a window whose end
    /// precedes its start wraps past midnight. Slots with unparsable
    /// times never match.
    pub fn covers(&self, at: NaiveTime) -> bool {
        let start = match NaiveTime::parse_from_str(&self.start_time, "%H:%M") {
            Ok(t) => t,
            Err(_) => return false,
        };
        let end = match NaiveTime::parse_from_str(&self.end_time, "%H:%M") {
            Ok(t) => t,
            Err(_) => return false,
        };

        if start < end {
            at >= start && at < end
        } else if start > end {
            at >= start || at < end
        } else {
            false
        }
    }
}

/// A geographic region with a flat delivery surcharge. The bounds document
/// is opaque here; zone membership is resolved upstream and orders arrive
/// with a `zone_id`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Zone {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub fee: Decimal,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Document>,
}

/// One date on the platform holiday calendar.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Holiday {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub date: NaiveDate,
    pub is_active: bool,
}

/// Platform-wide settings singleton, keyed by `key: "platform"`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformSettings {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub key: String,
    pub default_commission_percent: Option<Decimal>,
}

/// One consistent read of everything fee computation needs. Assembled in
/// a single pass per quote so a config edit mid-request can't produce a
/// breakdown mixing old and new parameters.
#[derive(Debug, Clone, Serialize)]
pub struct PricingSnapshot {
    pub config: Option<PricingConfig>,
    pub time_slots: Vec<TimeSlot>,
    pub zones: Vec<Zone>,
    pub holidays: Vec<NaiveDate>,
}
