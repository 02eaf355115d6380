use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::middleware::auth::Claims;
use crate::routes::core_error_response;
use crate::services::commission_ledger::{BucketGranularity, CommissionLedger, StatsFilter};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub driver_id: Option<String>,
}

/// Commission reporting for the admin dashboard: totals, status counts,
/// a time-bucketed rollup and the top-earning drivers.
pub async fn get_commission_stats(
    _claims: Claims,
    data: web::Data<Arc<Client>>,
    query: web::Query<StatsQuery>,
) -> impl Responder {
    let filter = match resolve_filter(&query.into_inner(), Utc::now()) {
        Ok(filter) => filter,
        Err(err) => return core_error_response(err),
    };

    let ledger = CommissionLedger::new(data.get_ref().clone());
    match ledger.aggregate(&filter).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(err) => core_error_response(err),
    }
}

/// Turn the query string into a concrete date range. Callers pick either a
/// named calendar period or an explicit from/to range, never both, so a
/// report always states exactly what it covers.
pub fn resolve_filter(query: &StatsQuery, now: DateTime<Utc>) -> Result<StatsFilter, CoreError> {
    let has_range = query.from.is_some() || query.to.is_some();

    match (&query.period, has_range) {
        (Some(_), true) => Err(CoreError::validation(
            "period",
            "provide either period or from/to, not both",
        )),
        (Some(period), false) => {
            let today = now.date_naive();
            let (start, end, granularity) =
                period_range(period, today).ok_or_else(|| {
                    CoreError::validation(
                        "period",
                        "period must be one of day, week, month, year",
                    )
                })?;
            Ok(StatsFilter {
                from: start_of_day(start),
                to: start_of_day(end),
                driver_id: query.driver_id.clone(),
                granularity,
            })
        }
        (None, true) => {
            let (from, to) = match (&query.from, &query.to) {
                (Some(from), Some(to)) => (parse_date("from", from)?, parse_date("to", to)?),
                _ => {
                    return Err(CoreError::validation(
                        "from",
                        "both from and to are required for an explicit range",
                    ))
                }
            };
            if from > to {
                return Err(CoreError::validation("from", "from must not be after to"));
            }

            // The range is inclusive of both days
            let start = start_of_day(from);
            let end = start_of_day(to + Duration::days(1));
            Ok(StatsFilter {
                from: start,
                to: end,
                driver_id: query.driver_id.clone(),
                granularity: BucketGranularity::for_span(start, end),
            })
        }
        (None, false) => Err(CoreError::validation(
            "period",
            "period or a from/to range is required",
        )),
    }
}

fn period_range(
    period: &str,
    today: NaiveDate,
) -> Option<(NaiveDate, NaiveDate, BucketGranularity)> {
    match period {
        "day" => Some((today, today + Duration::days(1), BucketGranularity::Hour)),
        "week" => {
            let start = today.week(Weekday::Mon).first_day();
            Some((start, start + Duration::days(7), BucketGranularity::Day))
        }
        "month" => {
            let start = today.with_day(1)?;
            let end = if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
            };
            Some((start, end, BucketGranularity::Day))
        }
        "year" => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
            let end = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?;
            Some((start, end, BucketGranularity::Month))
        }
        _ => None,
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::validation(field, format!("{} must be a YYYY-MM-DD date", field)))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
