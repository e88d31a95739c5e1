use anyhow::Context;
use std::{fs, sync::Arc};
use tracing_subscriber::EnvFilter;

use site_predictor::{
    config::{EngineConfig, ServerConfig},
    reload::ModelWatcher,
    server,
    tracker::TailBand,
    ModelStore, SiteModel, SitePredictionEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env()?;
    let engine_cfg = match &cfg.engine_config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    tracing::info!("engine config: {:?}", engine_cfg);

    // no generation to fall back on yet, so the first load must succeed
    let model = SiteModel::load(&cfg.model_path)
        .with_context(|| format!("failed to load initial model {}", cfg.model_path.display()))?;
    let last_modified = fs::metadata(&cfg.model_path).and_then(|m| m.modified()).ok();
    tracing::info!("loaded model for {} vehicles from {}", model.len(), cfg.model_path.display());

    let store = Arc::new(ModelStore::new(model, TailBand::from_config(&engine_cfg)));
    let engine = Arc::new(SitePredictionEngine::new(Arc::clone(&store), &engine_cfg));

    match cfg.poll_interval {
        Some(every) => {
            let watcher = ModelWatcher::new(cfg.model_path.clone(), Arc::clone(&store), last_modified);
            tokio::spawn(watcher.run(every));
            tracing::info!("polling {} every {:?}", cfg.model_path.display(), every);
        }
        None => tracing::info!("model polling disabled"),
    }

    let app = server::router(engine);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
