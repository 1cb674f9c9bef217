// src/main.rs
use std::sync::Arc;

use anyhow::Result as AnyhowResult;
use dotenvy::dotenv;
use elastic_money_dashboard::config::Settings;
use elastic_money_dashboard::dapp::{Dapp, DappFactory};
use elastic_money_dashboard::dashboard::Dashboard;
use elastic_money_dashboard::evm::EvmDapp;
use elastic_money_dashboard::poller::Poller;
use elastic_money_dashboard::tx::TxPopup;
use elastic_money_dashboard::api;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    info!(?settings, "configuration loaded");

    let factory: DappFactory = {
        let settings = settings.clone();
        Arc::new(move || Arc::new(EvmDapp::new(settings.clone())) as Arc<dyn Dapp>)
    };
    let dashboard = Arc::new(Dashboard::new(factory, TxPopup::new()));

    let init = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.init().await })
    };
    let poller = Poller::spawn(dashboard.clone(), settings.poll_interval);

    let app = api::router(dashboard, settings.deployment.clone());
    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    poller.stop();
    init.abort();
    Ok(())
}
