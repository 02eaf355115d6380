use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use swifteats_api::db;
use swifteats_api::middleware;
use swifteats_api::models::account::UserRole;
use swifteats_api::routes;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    db::mongo::ensure_indexes(&client).await;
    println!("MongoDB connection established");

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(client.clone()))
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    // Public routes
                    .service(
                        web::scope("/delivery")
                            .route("/quote", web::post().to(routes::pricing::get_quote)),
                    )
                    .route(
                        "/pricing/active",
                        web::get().to(routes::pricing::get_active_pricing),
                    )
                    // Settlement and reporting require a token from the
                    // auth service; state transitions are admin-only
                    .service(
                        web::scope("/commissions")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(
                                "/settle",
                                web::post().to(routes::commission::settle_commission),
                            )
                            .service(
                                web::resource("/stats")
                                    .wrap(middleware::role_auth::RequireRole::new(UserRole::Admin))
                                    .route(web::get().to(routes::stats::get_commission_stats)),
                            )
                            .service(
                                web::resource("/{order_id}/pay")
                                    .wrap(middleware::role_auth::RequireRole::new(UserRole::Admin))
                                    .route(
                                        web::put().to(routes::commission::mark_commission_paid),
                                    ),
                            )
                            .service(
                                web::resource("/{order_id}/cancel")
                                    .wrap(middleware::role_auth::RequireRole::new(UserRole::Admin))
                                    .route(web::put().to(routes::commission::cancel_commission)),
                            )
                            .route(
                                "/{order_id}",
                                web::get().to(routes::commission::get_commission),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
