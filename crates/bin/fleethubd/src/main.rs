use anyhow::Context;
use fleethubd::config::Config;
use fleethubd::wiring::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    let app = App::from_config(&config).await?;
    let registered = app
        .start()
        .await
        .context("failed to load stored automations")?;
    tracing::info!(registered, "fleethubd running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    app.shutdown();
    Ok(())
}
