use actix_web::{web, HttpResponse, Responder};
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::db::mongo::DELIVERY_DB;
use crate::services::pricing_service::PricingService;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(client: web::Data<Arc<Client>>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // Check MongoDB connection
    let mongo_result = check_mongodb(&client).await;
    health
        .services
        .insert("mongodb".to_string(), mongo_result.clone());

    // Check that a pricing config is published; quoting is down without one
    let pricing_result = check_active_pricing(&client).await;
    health
        .services
        .insert("pricing_config".to_string(), pricing_result.clone());

    if mongo_result.status != "ok" || pricing_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: &web::Data<Arc<Client>>) -> ServiceStatus {
    match client
        .database(DELIVERY_DB)
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Connected successfully to MongoDB".to_string()),
        },
        Err(e) => {
            eprintln!("MongoDB health check failed: {}", e);

            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to connect: {}", e)),
            }
        }
    }
}

async fn check_active_pricing(client: &web::Data<Arc<Client>>) -> ServiceStatus {
    let pricing = PricingService::new(client.get_ref().clone());
    match pricing.get_active_pricing_config().await {
        Ok(Some(config)) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("Active pricing config: {}", config.name)),
        },
        Ok(None) => ServiceStatus {
            status: "error".to_string(),
            details: Some("No active pricing configuration published".to_string()),
        },
        Err(e) => ServiceStatus {
            status: "error".to_string(),
            details: Some(format!("Failed to read pricing config: {}", e)),
        },
    }
}
