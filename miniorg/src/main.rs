use anyhow::Context;
use miniorg::{app, config::Config, observability::init_tracing, server::Server, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path).with_context(|| format!("loading configuration from {}", path))?,
        None => Config::load().context("loading configuration")?,
    };

    init_tracing(&config)?;

    let state = AppState::builder()
        .config(config.clone())
        .build()
        .await
        .context("connecting to the database")?;

    let router = app::router(state)?;
    Server::new(config).serve(router).await?;

    Ok(())
}
