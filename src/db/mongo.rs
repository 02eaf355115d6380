use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::models::commission::CommissionRecord;

pub const DELIVERY_DB: &str = "Delivery";

pub async fn create_mongo_client(uri: &String) -> Arc<Client> {
    println!("Connecting to MongoDB: {}", uri);

    // Configure MongoDB client options with more robust settings
    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    // Set a reasonable timeout for operations
    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    // Set the server API if using MongoDB 5.0+
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    // Create the client and check if it can connect
    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    // Test the connection to make sure it works
    match client
        .database(DELIVERY_DB)
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => println!("Successfully connected to MongoDB and verified with ping command"),
        Err(e) => {
            eprintln!("WARNING: Connected to MongoDB but ping test failed: {}", e);
            eprintln!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

/// Create the indexes settlement correctness depends on. The unique index
/// on `Commissions.order_id` keeps concurrent settle calls from producing
/// two records for one order, so startup fails hard if it cannot be built.
pub async fn ensure_indexes(client: &Client) {
    let commissions: mongodb::Collection<CommissionRecord> =
        client.database(DELIVERY_DB).collection("Commissions");

    let order_id_unique = IndexModel::builder()
        .keys(doc! { "order_id": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    commissions
        .create_index(order_id_unique)
        .await
        .expect("Failed to create unique index on Commissions.order_id");

    println!("Commission indexes in place");
}
