use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mnemonic_hunt::{
    api,
    config::Config,
    integrations::{HttpFacilitator, OpenAiImageClient},
    services::Treasury,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mnemonic_hunt=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Mnemonic Hunt server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Payment network: {}", config.payment_network);
    if config.is_testnet() {
        tracing::warn!("Running against a test network; payments are not final");
    }

    let treasury = Treasury::from_config(&config)?;
    tracing::info!("Treasury address: {}", treasury.address_checksum());

    let generator = OpenAiImageClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.image_model.clone(),
    );
    if !generator.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; image generation will fail");
    }
    let facilitator = HttpFacilitator::new(
        config.facilitator_url.clone(),
        config.facilitator_api_key.clone(),
    )?;

    let app_state = api::AppState {
        config: config.clone(),
        generator: Arc::new(generator),
        facilitator: Arc::new(facilitator),
        treasury,
    };

    // Build router
    let app = api::build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
