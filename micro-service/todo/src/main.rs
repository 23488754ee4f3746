use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber, layer::SubscriberExt};

use app_config::{AppConfig, Server};
use app_database::{db_connect::initialize_db, schema::define_schema};
use app_error::AppError;
use micro_todo::{routes, service::Services};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::load()?;

    // An empty DSN leaves sentry disabled
    let sentry_config = &config.monitoring.sentry;
    let _guard = sentry::init((
        sentry_config.dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(sentry_config.environment.clone().into()),
            sample_rate: sentry_config.sample_rate,
            traces_sample_rate: sentry_config.traces_sample_rate,
            ..Default::default()
        },
    ));

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.monitoring.logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    let subscriber = subscriber.with(sentry_tracing::layer());
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        "Starting application at {} ({})",
        chrono::Utc::now(),
        config.environment
    );

    let server = Server::from(&config);
    server.validate()?;

    let db = initialize_db(&config.database).await?;
    define_schema(&db).await?;

    let services = Services::from_config(Arc::clone(&db), &config)?;
    let app = routes::create_routes(services.access, services.credentials, &config);

    let address = server.socket_address();
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind to address: {}", address))?;

    info!("Todo service listening on http://{}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
