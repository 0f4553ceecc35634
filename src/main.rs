use spend_dashboard::{router, storage, AppState, Config};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(
        "data file {}, averaging over {}, coercion {:?}",
        config.data_path.display(),
        config.day_window,
        config.coercion
    );
    let port = config.port;
    let state = AppState::new(config);

    if let Err(err) = storage::reload(&state).await {
        error!("starting without data: {}", err.message);
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
