use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::order::OrderContext;
use crate::models::pricing::{PricingConfig, PricingSnapshot, TimeSlot, Zone};
use crate::services::round_to_cents;

/// Per-component result of a fee computation. Every intermediate term is
/// exposed so callers and tests can assert on each one independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_fee: Decimal,
    pub distance_fee: Decimal,
    pub remote_fee: Decimal,
    pub zone_fee: Decimal,
    pub multi_stop_fee: Decimal,
    pub time_multiplier: Decimal,
    pub total_fee: Decimal,
}

pub struct FeeCalculator;

impl FeeCalculator {
    /// Compute the delivery fee for one order against a pricing snapshot.
    ///
    /// Pure: no I/O, no hidden state. The same context and snapshot always
    /// produce the same breakdown. An inactive or missing config is an
    /// error, never a fallback to built-in numbers.
    pub fn compute(
        ctx: &OrderContext,
        snapshot: &PricingSnapshot,
    ) -> Result<FeeBreakdown, CoreError> {
        if ctx.subtotal < Decimal::ZERO {
            return Err(CoreError::validation("subtotal", "subtotal cannot be negative"));
        }
        if ctx.distance_km < Decimal::ZERO {
            return Err(CoreError::validation(
                "distance_km",
                "distance_km cannot be negative",
            ));
        }
        if ctx.stop_count < 1 {
            return Err(CoreError::validation(
                "stop_count",
                "stop_count must be at least 1",
            ));
        }

        let config = match snapshot.config.as_ref() {
            Some(config) if config.is_active => config,
            _ => return Err(CoreError::ConfigInactive),
        };

        // Orders at or above the threshold ship free of the base charge.
        let base_fee = if ctx.subtotal >= config.free_delivery_threshold {
            Decimal::ZERO
        } else {
            config.base_fee
        };

        let billable_km = (ctx.distance_km - config.max_free_distance_km).max(Decimal::ZERO);
        let distance_fee = billable_km * config.price_per_km;

        let remote_fee = if ctx.distance_km > config.remote_zone_distance_km {
            config.remote_zone_fee
        } else {
            Decimal::ZERO
        };

        let zone_fee = Self::zone_fee(ctx.zone_id.as_deref(), &snapshot.zones);

        let multi_stop_fee = Decimal::from(ctx.stop_count - 1) * config.multi_stop_fee;

        let time_multiplier =
            Self::time_multiplier(&ctx.placed_at, config, &snapshot.time_slots, &snapshot.holidays);

        let subtotal_fee = base_fee + distance_fee + remote_fee + zone_fee + multi_stop_fee;
        let total_fee = round_to_cents(subtotal_fee * time_multiplier);

        Ok(FeeBreakdown {
            base_fee,
            distance_fee,
            remote_fee,
            zone_fee,
            multi_stop_fee,
            time_multiplier,
            total_fee,
        })
    }

    /// Flat surcharge of the active zone the order was placed in. Unknown
    /// or inactive zones contribute nothing.
    fn zone_fee(zone_id: Option<&str>, zones: &[Zone]) -> Decimal {
        match zone_id {
            Some(id) => zones
                .iter()
                .find(|zone| {
                    zone.is_active && zone.id.map(|oid| oid.to_hex()).as_deref() == Some(id)
                })
                .map(|zone| zone.fee)
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    /// Exactly one multiplier applies per order: the highest-multiplier
    /// active slot covering the placement time, else the weekend rate,
    /// else the holiday rate, else 1. Multipliers never stack.
    fn time_multiplier(
        placed_at: &DateTime<Utc>,
        config: &PricingConfig,
        slots: &[TimeSlot],
        holidays: &[NaiveDate],
    ) -> Decimal {
        let time_of_day = placed_at.time();
        let slot_multiplier = slots
            .iter()
            .filter(|slot| slot.is_active && slot.covers(time_of_day))
            .map(|slot| slot.multiplier)
            .max();
        if let Some(multiplier) = slot_multiplier {
            return multiplier;
        }

        if matches!(placed_at.weekday(), Weekday::Sat | Weekday::Sun) {
            return config.weekend_multiplier;
        }
        if holidays.contains(&placed_at.date_naive()) {
            return config.holiday_multiplier;
        }
        Decimal::ONE
    }
}
