use sales_revenue_axum::{
    config::Config,
    error::AppError,
    logger,
    route::{self, AppState},
    shutdown,
    upstream::SalesClient,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialise Logging using the Tracing crate
    logger::init();

    let config = Config::from_env()?;
    let sales = SalesClient::from_config(&config)?;
    info!(sales_api = sales.base_url(), "Using sales API");

    let app = route::router(AppState::new(sales), config.request_timeout);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await?;

    Ok(())
}
