use mongodb::bson::{doc, Bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::db::mongo::DELIVERY_DB;
use crate::errors::CoreError;
use crate::models::commission::{CommissionRecord, CommissionStatus};
use crate::models::pricing::PlatformSettings;
use crate::services::round_to_cents;

/// Fallback used only when neither the caller nor the platform settings
/// supply a commission percent. This is the single silent default in the
/// settlement path; every other missing input is an error.
pub fn fallback_commission_percent() -> Decimal {
    Decimal::new(20, 0)
}

/// Splits delivery fees between the platform and the fulfilling driver and
/// persists exactly one commission record per order.
///
/// Settlement can be triggered from more than one event (order placement,
/// driver assignment, reassignment), possibly concurrently. The engine
/// takes no locks; the unique index on `order_id` plus an atomic upsert
/// carry the whole at-most-one-record guarantee.
pub struct CommissionEngine {
    client: Arc<Client>,
}

impl CommissionEngine {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn commissions(&self) -> Collection<CommissionRecord> {
        self.client.database(DELIVERY_DB).collection("Commissions")
    }

    fn settings(&self) -> Collection<PlatformSettings> {
        self.client.database(DELIVERY_DB).collection("Settings")
    }

    /// Compute the platform/driver split for a delivery fee.
    ///
    /// The driver amount is derived by subtraction rather than rounded
    /// independently, so `platform + driver == fee` holds to the cent for
    /// every valid input.
    pub fn split(
        delivery_fee: Decimal,
        commission_percent: Decimal,
    ) -> Result<(Decimal, Decimal), CoreError> {
        if delivery_fee < Decimal::ZERO {
            return Err(CoreError::validation(
                "delivery_fee",
                "delivery_fee cannot be negative",
            ));
        }
        if commission_percent < Decimal::ZERO || commission_percent > Decimal::ONE_HUNDRED {
            return Err(CoreError::validation(
                "commission_percent",
                "commission_percent must be between 0 and 100",
            ));
        }

        let platform_amount =
            round_to_cents(delivery_fee * commission_percent / Decimal::ONE_HUNDRED);
        let driver_amount = delivery_fee - platform_amount;
        Ok((platform_amount, driver_amount))
    }

    /// Caller-supplied percent if present, else the platform default from
    /// settings, else the documented fallback.
    pub async fn resolve_commission_percent(
        &self,
        requested: Option<Decimal>,
    ) -> Result<Decimal, CoreError> {
        if let Some(percent) = requested {
            return Ok(percent);
        }

        let settings = self.settings().find_one(doc! { "key": "platform" }).await?;
        Ok(settings
            .and_then(|s| s.default_commission_percent)
            .unwrap_or_else(fallback_commission_percent))
    }

    /// Settle an order's commission: create the record on the first call,
    /// update it in place on later calls while it is still pending.
    ///
    /// Safe to invoke from racing triggers. A duplicate-key failure from
    /// the upsert means a record for this order already exists outside the
    /// pending filter: either it is finalized (a permanent rejection) or a
    /// concurrent settle won the insert race a moment ago, in which case a
    /// single retry matches the now-existing row as a plain update.
    pub async fn settle(
        &self,
        order_id: &str,
        delivery_fee: Decimal,
        driver_id: Option<String>,
        commission_percent: Option<Decimal>,
    ) -> Result<CommissionRecord, CoreError> {
        if order_id.trim().is_empty() {
            return Err(CoreError::validation("order_id", "order_id cannot be empty"));
        }

        let percent = self.resolve_commission_percent(commission_percent).await?;
        let (platform_amount, driver_amount) = Self::split(delivery_fee, percent)?;

        let mut last_duplicate: Option<mongodb::error::Error> = None;
        for _ in 0..2 {
            let upserted = self
                .settle_upsert(
                    order_id,
                    &driver_id,
                    delivery_fee,
                    percent,
                    platform_amount,
                    driver_amount,
                )
                .await;

            match upserted {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {
                    return Err(CoreError::NotFound {
                        entity: "commission record",
                    })
                }
                Err(err) if is_duplicate_key_error(&err) => {
                    let existing = self
                        .commissions()
                        .find_one(doc! { "order_id": order_id })
                        .await?;
                    if let Some(existing) = existing {
                        if existing.status.is_terminal() {
                            return Err(CoreError::CommissionFinalized {
                                order_id: order_id.to_string(),
                            });
                        }
                    }
                    last_duplicate = Some(err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        match last_duplicate {
            Some(err) => Err(CoreError::Persistence(err)),
            None => Err(CoreError::NotFound {
                entity: "commission record",
            }),
        }
    }

    async fn settle_upsert(
        &self,
        order_id: &str,
        driver_id: &Option<String>,
        delivery_fee: Decimal,
        commission_percent: Decimal,
        platform_amount: Decimal,
        driver_amount: Decimal,
    ) -> Result<Option<CommissionRecord>, mongodb::error::Error> {
        let now = mongodb::bson::DateTime::now();

        let mut set = doc! {
            "delivery_fee": to_bson_value(&delivery_fee)?,
            "commission_percent": to_bson_value(&commission_percent)?,
            "platform_amount": to_bson_value(&platform_amount)?,
            "driver_amount": to_bson_value(&driver_amount)?,
            "updated_at": now,
        };
        let mut set_on_insert = doc! { "created_at": now };

        // A settle without a driver (the order-placement trigger) must not
        // clear an assignment written by the driver-assignment trigger.
        match driver_id {
            Some(id) => {
                set.insert("driver_id", id.clone());
            }
            None => {
                set_on_insert.insert("driver_id", Bson::Null);
            }
        }

        self.commissions()
            .find_one_and_update(
                doc! { "order_id": order_id, "status": CommissionStatus::Pending.as_str() },
                doc! { "$set": set, "$setOnInsert": set_on_insert },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
    }

    /// `pending -> paid`. Idempotent when the record is already paid.
    pub async fn mark_paid(&self, order_id: &str) -> Result<CommissionRecord, CoreError> {
        self.transition(order_id, CommissionStatus::Paid).await
    }

    /// `pending -> cancelled`. Idempotent when already cancelled.
    pub async fn cancel(&self, order_id: &str) -> Result<CommissionRecord, CoreError> {
        self.transition(order_id, CommissionStatus::Cancelled).await
    }

    async fn transition(
        &self,
        order_id: &str,
        target: CommissionStatus,
    ) -> Result<CommissionRecord, CoreError> {
        let updated = self
            .commissions()
            .find_one_and_update(
                doc! { "order_id": order_id, "status": CommissionStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": target.as_str(),
                    "updated_at": mongodb::bson::DateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(record) = updated {
            return Ok(record);
        }

        // Nothing pending matched: the record is missing, already in the
        // requested terminal state, or finalized the other way.
        match self
            .commissions()
            .find_one(doc! { "order_id": order_id })
            .await?
        {
            None => Err(CoreError::NotFound {
                entity: "commission record",
            }),
            Some(record) if record.status == target => Ok(record),
            Some(_) => Err(CoreError::CommissionFinalized {
                order_id: order_id.to_string(),
            }),
        }
    }

    pub async fn get(&self, order_id: &str) -> Result<CommissionRecord, CoreError> {
        match self
            .commissions()
            .find_one(doc! { "order_id": order_id })
            .await?
        {
            Some(record) => Ok(record),
            None => Err(CoreError::NotFound {
                entity: "commission record",
            }),
        }
    }
}

fn to_bson_value<T: Serialize>(value: &T) -> Result<Bson, mongodb::error::Error> {
    mongodb::bson::to_bson(value).map_err(mongodb::error::Error::custom)
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}
