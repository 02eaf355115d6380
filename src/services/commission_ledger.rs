use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::mongo::DELIVERY_DB;
use crate::errors::CoreError;
use crate::models::commission::{CommissionRecord, CommissionStatus};
use crate::services::round_to_cents;

/// How many drivers the earnings ranking returns.
pub const TOP_DRIVER_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketGranularity {
    Hour,
    Day,
    Month,
}

impl BucketGranularity {
    /// Granularity for an explicit date range: hourly for a day or two,
    /// daily up to a quarter, monthly beyond.
    pub fn for_span(from: DateTime<Utc>, to: DateTime<Utc>) -> BucketGranularity {
        let days = (to - from).num_days();
        if days <= 2 {
            BucketGranularity::Hour
        } else if days <= 92 {
            BucketGranularity::Day
        } else {
            BucketGranularity::Month
        }
    }

    /// Bucket label for a timestamp. Labels sort chronologically as plain
    /// strings, which keeps the rollup ordering trivial.
    fn label(&self, at: DateTime<Utc>) -> String {
        match self {
            BucketGranularity::Hour => at.format("%Y-%m-%d %H:00").to_string(),
            BucketGranularity::Day => at.format("%Y-%m-%d").to_string(),
            BucketGranularity::Month => at.format("%Y-%m").to_string(),
        }
    }
}

/// Record selection for one stats query.
#[derive(Debug, Clone)]
pub struct StatsFilter {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub driver_id: Option<String>,
    pub granularity: BucketGranularity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub paid: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsBucket {
    pub label: String,
    pub count: u64,
    pub total_delivery_fee: Decimal,
    pub total_platform_amount: Decimal,
    pub total_driver_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverEarnings {
    pub driver_id: String,
    pub deliveries: u64,
    pub total_driver_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionStats {
    pub count: u64,
    pub total_delivery_fee: Decimal,
    pub total_platform_amount: Decimal,
    pub total_driver_amount: Decimal,
    pub average_commission_percent: Decimal,
    pub status_counts: StatusCounts,
    pub buckets: Vec<StatsBucket>,
    pub top_drivers: Vec<DriverEarnings>,
}

impl CommissionStats {
    /// Fold a set of commission records into totals, per-status counts, a
    /// time-bucketed rollup and a driver earnings ranking. Pure so it can
    /// be tested without a database; the ledger only adds the fetch.
    pub fn from_records(
        records: &[CommissionRecord],
        granularity: BucketGranularity,
    ) -> CommissionStats {
        let mut total_delivery_fee = Decimal::ZERO;
        let mut total_platform_amount = Decimal::ZERO;
        let mut total_driver_amount = Decimal::ZERO;
        let mut total_percent = Decimal::ZERO;
        let mut status_counts = StatusCounts::default();
        let mut buckets: BTreeMap<String, StatsBucket> = BTreeMap::new();
        let mut per_driver: HashMap<String, (u64, Decimal)> = HashMap::new();

        for record in records {
            total_delivery_fee += record.delivery_fee;
            total_platform_amount += record.platform_amount;
            total_driver_amount += record.driver_amount;
            total_percent += record.commission_percent;

            match record.status {
                CommissionStatus::Pending => status_counts.pending += 1,
                CommissionStatus::Paid => status_counts.paid += 1,
                CommissionStatus::Cancelled => status_counts.cancelled += 1,
            }

            if let Some(created_at) = record.created_at {
                let label = granularity.label(created_at.to_chrono());
                let bucket = buckets.entry(label.clone()).or_insert_with(|| StatsBucket {
                    label,
                    count: 0,
                    total_delivery_fee: Decimal::ZERO,
                    total_platform_amount: Decimal::ZERO,
                    total_driver_amount: Decimal::ZERO,
                });
                bucket.count += 1;
                bucket.total_delivery_fee += record.delivery_fee;
                bucket.total_platform_amount += record.platform_amount;
                bucket.total_driver_amount += record.driver_amount;
            }

            if let Some(driver_id) = &record.driver_id {
                let entry = per_driver
                    .entry(driver_id.clone())
                    .or_insert((0, Decimal::ZERO));
                entry.0 += 1;
                entry.1 += record.driver_amount;
            }
        }

        let count = records.len() as u64;
        let average_commission_percent = if count == 0 {
            Decimal::ZERO
        } else {
            round_to_cents(total_percent / Decimal::from(count))
        };

        let mut top_drivers: Vec<DriverEarnings> = per_driver
            .into_iter()
            .map(|(driver_id, (deliveries, total))| DriverEarnings {
                driver_id,
                deliveries,
                total_driver_amount: total,
            })
            .collect();
        // Highest earnings first; equal earners in driver_id order so the
        // ranking is stable across runs.
        top_drivers.sort_by(|a, b| {
            b.total_driver_amount
                .cmp(&a.total_driver_amount)
                .then_with(|| a.driver_id.cmp(&b.driver_id))
        });
        top_drivers.truncate(TOP_DRIVER_COUNT);

        CommissionStats {
            count,
            total_delivery_fee,
            total_platform_amount,
            total_driver_amount,
            average_commission_percent,
            status_counts,
            buckets: buckets.into_values().collect(),
            top_drivers,
        }
    }
}

/// Read-only reporting over settled commission records. No write
/// authority; every mutation goes through `CommissionEngine`.
pub struct CommissionLedger {
    client: Arc<Client>,
}

impl CommissionLedger {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn commissions(&self) -> Collection<CommissionRecord> {
        self.client.database(DELIVERY_DB).collection("Commissions")
    }

    pub async fn aggregate(&self, filter: &StatsFilter) -> Result<CommissionStats, CoreError> {
        use futures::TryStreamExt;

        let mut query = doc! {
            "created_at": {
                "$gte": mongodb::bson::DateTime::from_chrono(filter.from),
                "$lt": mongodb::bson::DateTime::from_chrono(filter.to),
            }
        };
        if let Some(driver_id) = &filter.driver_id {
            query.insert("driver_id", driver_id.clone());
        }

        let cursor = self.commissions().find(query).await?;
        let records = cursor.try_collect::<Vec<CommissionRecord>>().await?;

        Ok(CommissionStats::from_records(&records, filter.granularity))
    }
}
