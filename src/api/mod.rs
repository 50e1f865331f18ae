// src/api/mod.rs

pub mod gm;
pub mod health;
pub mod image;
pub mod payment;
pub mod withdraw;

use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    constants::{PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER},
    integrations::PaymentFacilitator,
    services::{image_generator::ImageGenerator, treasury::Treasury},
};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn ImageGenerator>,
    pub facilitator: Arc<dyn PaymentFacilitator>,
    pub treasury: Treasury,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Paid image generation
        .route(
            "/image",
            get(image::generate_image).route_layer(middleware::from_fn_with_state(
                state.clone(),
                payment::require_payment,
            )),
        )
        // Treasury
        .route("/gm", get(gm::gm_proof))
        .route("/gm/verify", post(gm::verify_gm))
        .route("/withdraw", get(withdraw::withdraw))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let exposed = [
        HeaderName::from_static(PAYMENT_REQUIRED_HEADER),
        HeaderName::from_static(PAYMENT_RESPONSE_HEADER),
    ];

    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(exposed);
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive().expose_headers(exposed);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(exposed)
}
