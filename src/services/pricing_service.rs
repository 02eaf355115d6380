use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::mongo::DELIVERY_DB;
use crate::errors::CoreError;
use crate::models::pricing::{
    Holiday, PlatformSettings, PricingConfig, PricingSnapshot, TimeSlot, Zone,
};

/// Read-only access to the pricing tables the admin dashboard maintains:
/// the active config, time-slot multipliers, zone surcharges and the
/// holiday calendar. Nothing here ever writes.
pub struct PricingService {
    client: Arc<Client>,
}

impl PricingService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(DELIVERY_DB).collection(name)
    }

    /// The single active pricing config, if one is published.
    pub async fn get_active_pricing_config(&self) -> Result<Option<PricingConfig>, CoreError> {
        let config = self
            .collection::<PricingConfig>("PricingConfigs")
            .find_one(doc! { "is_active": true })
            .await?;
        Ok(config)
    }

    pub async fn list_active_time_slots(&self) -> Result<Vec<TimeSlot>, CoreError> {
        let cursor = self
            .collection::<TimeSlot>("TimeSlots")
            .find(doc! { "is_active": true })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn list_active_zones(&self) -> Result<Vec<Zone>, CoreError> {
        let cursor = self
            .collection::<Zone>("Zones")
            .find(doc! { "is_active": true })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn list_holiday_dates(&self) -> Result<Vec<NaiveDate>, CoreError> {
        let cursor = self
            .collection::<Holiday>("Holidays")
            .find(doc! { "is_active": true })
            .await?;
        let holidays: Vec<Holiday> = cursor.try_collect().await?;
        Ok(holidays.into_iter().map(|holiday| holiday.date).collect())
    }

    /// The platform-wide default commission percent, when one is set.
    pub async fn default_commission_percent(&self) -> Result<Option<Decimal>, CoreError> {
        let settings = self
            .collection::<PlatformSettings>("Settings")
            .find_one(doc! { "key": "platform" })
            .await?;
        Ok(settings.and_then(|s| s.default_commission_percent))
    }

    /// Assemble everything fee computation needs in one pass, so a quote
    /// never mixes parameters from two config revisions.
    pub async fn load_snapshot(&self) -> Result<PricingSnapshot, CoreError> {
        let config = self.get_active_pricing_config().await?;
        let time_slots = self.list_active_time_slots().await?;
        let zones = self.list_active_zones().await?;
        let holidays = self.list_holiday_dates().await?;

        Ok(PricingSnapshot {
            config,
            time_slots,
            zones,
            holidays,
        })
    }
}
