//! Term Deposit Prediction API - Main Entry Point
//!
//! Loads the model artifact, then serves predictions over HTTP. The server
//! only binds once the artifact has loaded; any load failure exits non-zero.

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use term_deposit_api::{
    api::{self, AppState},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging, InferenceEngine,
};
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration; a path given on the command line must exist
    let (config, config_path) = match std::env::args().nth(1) {
        Some(path) => (AppConfig::load_from_path(&path)?, path),
        None => (AppConfig::load()?, DEFAULT_CONFIG_PATH.to_string()),
    };

    // Initialize logging
    logging::init(&config.logging)?;
    info!(config = %config_path, "Starting Term Deposit Prediction API");

    // Load the model artifact; no partial-availability mode
    let engine = InferenceEngine::new(&config.model).with_context(|| {
        format!(
            "Failed to load model artifact from {}",
            config.model.path.display()
        )
    })?;
    let state = web::Data::new(AppState::new(engine));

    let bind_address = config.bind_address();
    let json_limit = config.server.json_limit_bytes;
    info!(address = %bind_address, "Model ready, starting HTTP server");

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure(json_limit))
            .default_service(web::to(api::not_found))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server terminated with an error")?;

    info!("Server shut down");
    Ok(())
}
