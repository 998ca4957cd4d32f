use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use novelsum_core::{GraphRankSummarizer, HfInferenceBackend, NeuralSummarizer, config_file};
use novelsum_pdf_mupdf::MupdfBackend;
use novelsum_web::state::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = config_file::resolve(&config_file::load_config());
    config.apply_env();
    tracing::debug!(?config, "resolved configuration");

    if config.api_token.is_none() {
        tracing::warn!("HF_API_TOKEN is not set; the inference endpoint may reject requests");
    }

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let neural = NeuralSummarizer::new(Arc::new(HfInferenceBackend::from_config(client, &config)))
        .with_max_input_chars(config.max_input_chars)
        .with_min_length(config.min_length);
    let graph_rank = GraphRankSummarizer::from_config(&config);
    let pdf_backend = Arc::new(MupdfBackend::from_config(&config));

    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config, pdf_backend, neural, graph_rank));
    state::spawn_session_reaper(state.clone(), Duration::from_secs(60));

    let app = novelsum_web::router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
