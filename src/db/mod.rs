use log::{error, info};
use mongodb::{Client, Database};
use rocket::fairing::AdHoc;

use crate::config::Config;
use crate::services::review::{RetryPolicy, ReviewService};
use crate::store::mongo::MongoStore;

pub type DbConn = Database;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok((client, database)) => {
                info!("✓ MongoDB connected successfully");
                let reviews = ReviewService::new(
                    MongoStore::new(client, database.clone()),
                    RetryPolicy::from_config(),
                );
                rocket.manage(database).manage(reviews)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<(Client, Database), mongodb::error::Error> {
    let uri = Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;

    let database = client.database("promarket");
    Ok((client, database))
}
