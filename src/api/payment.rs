use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    config::Config,
    constants::{
        IMAGE_RESOURCE_DESCRIPTION, LEGACY_PAYMENT_HEADER, PAYMENT_MAX_TIMEOUT_SECS,
        PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PAYMENT_SCHEME_EXACT,
        PAYMENT_SIGNATURE_HEADER, X402_VERSION,
    },
    error::AppError,
    models::{PaymentRequired, PaymentRequirements, ResourceInfo},
    services::{pricing::to_usdc_units, selection::Selection},
};

use super::{image::ImageQuery, AppState};

/// Payment gate for `/image`.
///
/// Selections are validated before any payment is asked for, so a malformed request never
/// produces a challenge. Settlement only happens once the handler has produced an image.
pub async fn require_payment(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let query = match Query::<ImageQuery>::try_from_uri(request.uri()) {
        Ok(Query(query)) => query,
        Err(rejection) => return AppError::BadRequest(rejection.body_text()).into_response(),
    };

    // Missing idx is the handler's 400 to report.
    let Some(raw) = query.idx.as_deref() else {
        return next.run(request).await;
    };
    let selection = match Selection::parse(raw) {
        Ok(selection) => selection,
        Err(e) => return AppError::from(e).into_response(),
    };

    let requirements = requirements_for(&state.config, &selection);
    let resource = ResourceInfo {
        url: resource_url(&state.config, request.headers(), request.uri()),
        description: IMAGE_RESOURCE_DESCRIPTION.to_string(),
        mime_type: "application/json".to_string(),
    };

    let Some(header_value) = payment_header(request.headers()) else {
        tracing::debug!("No payment header for [{}], issuing challenge", selection);
        return challenge(resource, requirements, "Payment required");
    };

    let payload = match decode_payload(&header_value) {
        Some(payload) => payload,
        None => return challenge(resource, requirements, "Invalid payment header"),
    };

    match state.facilitator.verify(&payload, &requirements).await {
        Ok(verified) if verified.is_valid => {
            tracing::info!(
                "Payment verified for [{}] from {}",
                selection,
                verified.payer.as_deref().unwrap_or("unknown payer")
            );
        }
        Ok(verified) => {
            let reason = verified
                .invalid_reason
                .unwrap_or_else(|| "Payment verification failed".to_string());
            return challenge(resource, requirements, &reason);
        }
        Err(e) => return e.into_response(),
    }

    let mut response = next.run(request).await;
    if !response.status().is_success() {
        tracing::warn!(
            "Handler failed with {} for [{}]; payment not settled",
            response.status(),
            selection
        );
        return response;
    }

    let settlement = match state.facilitator.settle(&payload, &requirements).await {
        Ok(settlement) if settlement.success => settlement,
        Ok(settlement) => {
            let reason = settlement
                .error_reason
                .unwrap_or_else(|| "Payment settlement failed".to_string());
            return challenge(resource, requirements, &reason);
        }
        Err(e) => {
            tracing::error!("Settlement failed: {}", e);
            return challenge(resource, requirements, "Payment settlement failed");
        }
    };

    tracing::info!("Payment settled in {}", settlement.transaction);
    if let Some(value) = encode_header(&settlement) {
        response.headers_mut().insert(PAYMENT_RESPONSE_HEADER, value);
    }
    response
}

pub fn requirements_for(config: &Config, selection: &Selection) -> PaymentRequirements {
    PaymentRequirements {
        scheme: PAYMENT_SCHEME_EXACT.to_string(),
        network: config.payment_network.clone(),
        amount: to_usdc_units(selection.price()).to_string(),
        asset: config.usdc_address.clone(),
        pay_to: config.pay_to_address.clone(),
        max_timeout_seconds: PAYMENT_MAX_TIMEOUT_SECS,
        extra: Some(json!({ "name": "USD Coin", "version": "2" })),
    }
}

fn resource_url(config: &Config, headers: &HeaderMap, uri: &axum::http::Uri) -> String {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/image");
    match config.public_base_url.as_deref() {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{}{}", host, path)
        }
    }
}

fn payment_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .or_else(|| headers.get(LEGACY_PAYMENT_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn decode_payload(encoded: &str) -> Option<Value> {
    let bytes = STANDARD.decode(encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn encode_header<T: Serialize>(document: &T) -> Option<HeaderValue> {
    let bytes = serde_json::to_vec(document).ok()?;
    HeaderValue::from_str(&STANDARD.encode(bytes)).ok()
}

fn challenge(resource: ResourceInfo, requirements: PaymentRequirements, error: &str) -> Response {
    let body = PaymentRequired {
        x402_version: X402_VERSION,
        error: Some(error.to_string()),
        resource,
        accepts: vec![requirements],
    };

    let mut response = (StatusCode::PAYMENT_REQUIRED, Json(&body)).into_response();
    if let Some(value) = encode_header(&body) {
        response.headers_mut().insert(PAYMENT_REQUIRED_HEADER, value);
    }
    response
}
