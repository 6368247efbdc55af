use dotenvy::dotenv;
use log::info;

use qmsserver::core::config::AppConfig;
use qmsserver::main_module::{build_state, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    info!(
        "Starting qmsserver {} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_address()
    );

    let state = build_state(config).await?;
    run_server(state).await?;
    info!("Server stopped");
    Ok(())
}
