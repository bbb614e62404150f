//! Naradai - dashboard content API

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use naradai::{
    config::{Args, StorageBackend},
    db::{redact_uri, MongoClient},
    logging, server, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Naradai - dashboard content API");
    info!("======================================");
    info!("Listen: {}:{}", args.host, args.port);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Storage: {}", args.storage.as_str());
    if args.storage == StorageBackend::Mongo {
        info!(
            "MongoDB: {} (database '{}')",
            redact_uri(&args.mongodb_uri),
            args.mongodb_database
        );
    }
    info!("Request timeout: {} ms", args.request_timeout_ms);
    info!("======================================");

    let (state, mongo) = match args.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            (AppState::in_memory(args)?, None)
        }
        StorageBackend::Mongo => {
            match MongoClient::new(&args.mongodb_uri, &args.mongodb_database).await {
                Ok(client) => {
                    info!("Opening collections in '{}'", client.db_name());
                    let state = AppState::with_mongo(args, &client).await?;
                    (state, Some(client))
                }
                Err(e) if args.dev_mode => {
                    warn!("MongoDB connection failed (dev mode, using memory store): {}", e);
                    (AppState::in_memory(args)?, None)
                }
                Err(e) => {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    info!("Serving with {} storage", state.storage.as_str());

    let result = server::run(Arc::new(state)).await;

    if let Some(client) = mongo {
        client.shutdown().await;
    }

    if let Err(e) = &result {
        error!("Server error: {}", e);
    }
    info!("Naradai stopped");

    result.map_err(Into::into)
}
