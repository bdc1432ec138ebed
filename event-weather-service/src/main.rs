use event_weather_service::{
    api_client::OpenWeatherClient,
    cache::WeatherCache,
    clock::{Clock, SystemClock},
    config::Config,
    events::EventStore,
    handlers::AppState,
    rate_limit::ClientRateLimiter,
    router,
    service::WeatherService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    common::tracing::init(config.log_format);

    if config.openweather_api_key.is_empty() {
        warn!("OPENWEATHER_API_KEY is not set; provider requests will be rejected");
    }

    let shutdown = CancellationToken::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache = Arc::new(WeatherCache::new(clock.clone()));
    let provider = OpenWeatherClient::new(&config, clock.clone())?;
    let weather = Arc::new(WeatherService::new(provider, cache, clock.clone()));
    let events = Arc::new(EventStore::open(&config.events_file).await?);

    let client_limiter = ClientRateLimiter::new(
        config.client_rate_limit,
        Duration::from_secs(config.client_rate_window_seconds),
    );

    let app = router(AppState {
        weather,
        events,
        started_at: clock.now(),
        clock,
        client_limiter,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Event weather service starting on {}", addr);

    tokio::spawn(shutdown_signal(shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;

    info!("Event weather service stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    shutdown.cancel();
}
