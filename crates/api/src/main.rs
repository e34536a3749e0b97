use anyhow::Context;

use orderdesk_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    orderdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = orderdesk_api::app::build_app_from_config(&config).await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.use_persistent_stores(),
        transitions = ?config.transition_policy,
        stock_policy = ?config.stock_policy,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
