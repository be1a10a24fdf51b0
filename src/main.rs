use std::sync::Arc;

use clap::Parser;

use dataxo::handlers::{self, AppState};
use dataxo::{DisappearingMode, GameUseCase, InMemoryGameRepository, ServerConfig};

#[tokio::main]
async fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    let mode_config = config.mode_config();

    let mode = match DisappearingMode::new(mode_config) {
        Ok(mode) => mode,
        Err(e) => {
            log::error!("can't create disappearing game mode: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("game mode {:?}", mode_config);

    let repo = Arc::new(InMemoryGameRepository::new());
    let use_case = Arc::new(GameUseCase::new(repo, Arc::new(mode)));
    let state = AppState::new(use_case, config.broadcast_capacity);
    let app = handlers::router(state);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("can't bind {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };
    log::info!("Starting dataxo {} on {}", dataxo::VERSION, config.addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        log::error!("server error: {}", e);
        std::process::exit(1);
    }

    log::info!("graceful shutdown has completed");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("can't listen for shutdown signal: {}", e);
        return;
    }
    log::info!("graceful shutdown is beginning...");
}
