use std::collections::HashMap;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, Responder};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use swifteats_api::errors::CoreError;
use swifteats_api::middleware::auth::{AuthMiddleware, Claims};
use swifteats_api::middleware::role_auth::RequireRole;
use swifteats_api::models::account::UserRole;
use swifteats_api::models::commission::{CommissionRecord, CommissionStatus};
use swifteats_api::models::order::OrderContext;
use swifteats_api::models::pricing::{PricingConfig, PricingSnapshot, TimeSlot, Zone};
use swifteats_api::routes::commission::SettleInput;
use swifteats_api::routes::core_error_response;
use swifteats_api::routes::stats::{resolve_filter, StatsQuery};
use swifteats_api::services::commission_engine::{fallback_commission_percent, CommissionEngine};
use swifteats_api::services::commission_ledger::CommissionStats;
use swifteats_api::services::fee_calculator::FeeCalculator;

pub const FIXTURE_ZONE_ID: &str = "64b000000000000000000001";

pub type CommissionStore = Mutex<HashMap<String, CommissionRecord>>;

/// Exercises the real route contract (auth middleware, role guard, fee
/// calculator, split math, settlement state machine) against an in-memory
/// commission store, so the suite runs without a MongoDB instance.
pub struct TestApp {
    pub records: web::Data<CommissionStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            records: web::Data::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.records.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/delivery").route("/quote", web::post().to(mock_quote)),
                    )
                    .route("/pricing/active", web::get().to(mock_active_pricing))
                    .service(
                        web::scope("/commissions")
                            .wrap(AuthMiddleware)
                            .route("/settle", web::post().to(mock_settle))
                            .service(
                                web::resource("/stats")
                                    .wrap(RequireRole::new(UserRole::Admin))
                                    .route(web::get().to(mock_stats)),
                            )
                            .service(
                                web::resource("/{order_id}/pay")
                                    .wrap(RequireRole::new(UserRole::Admin))
                                    .route(web::put().to(mock_pay)),
                            )
                            .service(
                                web::resource("/{order_id}/cancel")
                                    .wrap(RequireRole::new(UserRole::Admin))
                                    .route(web::put().to(mock_cancel)),
                            )
                            .route("/{order_id}", web::get().to(mock_get)),
                    ),
            )
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Pricing snapshot with the same numbers the unit suites use, so HTTP
/// assertions can be written against known totals.
pub fn fixture_snapshot() -> PricingSnapshot {
    PricingSnapshot {
        config: Some(PricingConfig {
            id: None,
            name: "standard".to_string(),
            base_fee: dec("2.99"),
            price_per_km: dec("0.5"),
            free_delivery_threshold: dec("25"),
            max_free_distance_km: dec("5"),
            remote_zone_fee: dec("5"),
            remote_zone_distance_km: dec("15"),
            multi_stop_fee: dec("3"),
            rush_hour_multiplier: dec("1.5"),
            weekend_multiplier: dec("1.2"),
            holiday_multiplier: dec("1.5"),
            is_active: true,
            created_at: None,
            updated_at: None,
        }),
        time_slots: vec![TimeSlot {
            id: None,
            name: "dinner-rush".to_string(),
            start_time: "18:00".to_string(),
            end_time: "21:00".to_string(),
            multiplier: dec("1.5"),
            is_active: true,
        }],
        zones: vec![Zone {
            id: Some(ObjectId::parse_str(FIXTURE_ZONE_ID).unwrap()),
            name: "downtown".to_string(),
            fee: dec("1.5"),
            is_active: true,
            bounds: None,
        }],
        holidays: vec![],
    }
}

/// "Bearer ..." header value for a token the auth middleware will accept.
pub fn bearer_token(role: &str) -> String {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: format!("{}@test.example", role),
        exp: now + 3600,
        iat: now,
        user_id: format!("test_user_{}", role),
        role: Some(role.to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token");
    format!("Bearer {}", token)
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

async fn mock_quote(input: web::Json<OrderContext>) -> impl Responder {
    match FeeCalculator::compute(&input.into_inner(), &fixture_snapshot()) {
        Ok(breakdown) => HttpResponse::Ok().json(breakdown),
        Err(err) => core_error_response(err),
    }
}

async fn mock_active_pricing() -> impl Responder {
    let snapshot = fixture_snapshot();
    HttpResponse::Ok().json(serde_json::json!({
        "config": snapshot.config,
        "time_slots": snapshot.time_slots,
        "zones": snapshot.zones,
    }))
}

async fn mock_settle(
    store: web::Data<CommissionStore>,
    input: web::Json<SettleInput>,
) -> impl Responder {
    let input = input.into_inner();
    let percent = input
        .commission_percent
        .unwrap_or_else(fallback_commission_percent);
    let (platform_amount, driver_amount) =
        match CommissionEngine::split(input.delivery_fee, percent) {
            Ok(amounts) => amounts,
            Err(err) => return core_error_response(err),
        };

    let now = mongodb::bson::DateTime::now();
    let mut records = store.lock().unwrap();
    if let Some(existing) = records.get_mut(&input.order_id) {
        if existing.status.is_terminal() {
            return core_error_response(CoreError::CommissionFinalized {
                order_id: input.order_id,
            });
        }
        if let Some(driver_id) = input.driver_id {
            existing.driver_id = Some(driver_id);
        }
        existing.delivery_fee = input.delivery_fee;
        existing.commission_percent = percent;
        existing.platform_amount = platform_amount;
        existing.driver_amount = driver_amount;
        existing.updated_at = Some(now);
        return HttpResponse::Ok().json(existing.clone());
    }

    let record = CommissionRecord {
        id: None,
        order_id: input.order_id.clone(),
        driver_id: input.driver_id,
        delivery_fee: input.delivery_fee,
        commission_percent: percent,
        platform_amount,
        driver_amount,
        status: CommissionStatus::Pending,
        created_at: Some(now),
        updated_at: Some(now),
    };
    records.insert(input.order_id, record.clone());
    HttpResponse::Ok().json(record)
}

fn transition(
    store: &web::Data<CommissionStore>,
    order_id: String,
    target: CommissionStatus,
) -> HttpResponse {
    let now = mongodb::bson::DateTime::now();
    let mut records = store.lock().unwrap();
    match records.get_mut(&order_id) {
        None => core_error_response(CoreError::NotFound {
            entity: "commission record",
        }),
        Some(record) if record.status == CommissionStatus::Pending => {
            record.status = target;
            record.updated_at = Some(now);
            HttpResponse::Ok().json(record.clone())
        }
        Some(record) if record.status == target => HttpResponse::Ok().json(record.clone()),
        Some(_) => core_error_response(CoreError::CommissionFinalized { order_id }),
    }
}

async fn mock_pay(store: web::Data<CommissionStore>, path: web::Path<String>) -> impl Responder {
    transition(&store, path.into_inner(), CommissionStatus::Paid)
}

async fn mock_cancel(store: web::Data<CommissionStore>, path: web::Path<String>) -> impl Responder {
    transition(&store, path.into_inner(), CommissionStatus::Cancelled)
}

async fn mock_get(store: web::Data<CommissionStore>, path: web::Path<String>) -> impl Responder {
    let order_id = path.into_inner();
    let records = store.lock().unwrap();
    match records.get(&order_id) {
        Some(record) => HttpResponse::Ok().json(record.clone()),
        None => core_error_response(CoreError::NotFound {
            entity: "commission record",
        }),
    }
}

async fn mock_stats(
    store: web::Data<CommissionStore>,
    query: web::Query<StatsQuery>,
) -> impl Responder {
    let filter = match resolve_filter(&query.into_inner(), Utc::now()) {
        Ok(filter) => filter,
        Err(err) => return core_error_response(err),
    };

    let records = store.lock().unwrap();
    let selected: Vec<CommissionRecord> = records
        .values()
        .filter(|record| match &filter.driver_id {
            Some(driver_id) => record.driver_id.as_deref() == Some(driver_id.as_str()),
            None => true,
        })
        .cloned()
        .collect();

    HttpResponse::Ok().json(CommissionStats::from_records(&selected, filter.granularity))
}
