use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use voxrelay_api::{build_router, state::AppState};
use voxrelay_config::Settings;
use voxrelay_gateways::{HttpSynthesizer, LlmTranslator};
use voxrelay_speech::remote::RemoteSpeechBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::load()?;
    let timeout = Duration::from_millis(settings.gateway.timeout_ms);

    let speech = Arc::new(RemoteSpeechBackend::new(
        settings.speech.endpoint.clone(),
        settings.speech.api_key.clone(),
    ));
    let translator = Arc::new(LlmTranslator::new(&settings.translation, timeout)?);
    let synthesizer = Arc::new(HttpSynthesizer::new(&settings.synthesis, timeout)?);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(settings, speech, translator, synthesizer);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "voxrelay listening");
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
