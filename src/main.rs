use habit_arena::{initialize_data, router, AppState, Config, RemoteMirror};
use std::{net::SocketAddr, sync::Arc};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mirror = match &config.remote {
        Some(remote) => {
            info!("mirroring competition data to {}", remote.url);
            Some(Arc::new(RemoteMirror::new(remote)?))
        }
        None => {
            info!("no remote mirror configured, using local storage only");
            None
        }
    };

    let data = initialize_data(&config.data_path, mirror.as_deref())
        .await
        .map_err(|err| err.message)?;
    let state = AppState::new(config.data_path.clone(), data, mirror);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
}
