//! `mathwise serve` — Start the web chat and HTTP API.

use anyhow::Context;
use mathwise_config::AppConfig;

pub async fn run(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(host) = host {
        config.gateway.host = host;
    }
    super::require_api_key(&config)?;

    let url = format!("http://{}:{}", config.gateway.host, config.gateway.port);
    println!();
    println!("  {} {} — web chat", config.ui.icon, config.ui.title);
    println!();
    println!("  Open:      {url}/");
    println!("  API:       {url}/v1");
    println!("  Health:    {url}/health");
    println!("  Provider:  {} ({})", config.provider, config.model);
    println!();

    mathwise_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway error: {e}"))
}
