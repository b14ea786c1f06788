use anyhow::Context;

use shopdesk_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::load().context("failed to load configuration")?;
    shopdesk_observability::init(&cfg.logging);

    let app = shopdesk_api::app::build_app(&cfg).await?;

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.http.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
