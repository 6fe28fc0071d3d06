use rioos_apiserver::config::AppConfig;
use rioos_apiserver::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    println!("Rio/OS API server");

    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{} storage={:?} api={}",
        config.server.host, config.server.port, config.storage.backend, config.api.version
    );

    run_server(&config).await
}
