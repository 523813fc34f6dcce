use line_replay::{CsvSource, ReplayServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> line_replay::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "line_replay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!(
        dir = %config.source.directory.display(),
        glob = %config.source.pattern,
        encoding = %config.source.encoding,
        "Source"
    );
    tracing::info!(
        interval_secs = config.replay.interval.as_secs_f64(),
        speed = config.replay.speed_factor,
        looping = config.replay.loop_replay,
        "Pacing"
    );
    tracing::info!(
        line = config.normalize.line_filter.as_deref().unwrap_or("ALL"),
        tool = config.normalize.tool_filter.as_deref().unwrap_or("ALL"),
        "Filters"
    );

    let source = CsvSource::new(config.source.clone())?;
    let server = ReplayServer::new(config, source);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
}
