use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    error::Result,
    models::{GmProof, GmVerifyRequest, GmVerifyResponse},
};

use super::AppState;

/// GET /gm
pub async fn gm_proof(State(state): State<AppState>) -> Result<Json<GmProof>> {
    let proof = state.treasury.gm_proof(Utc::now()).await?;
    Ok(Json(proof))
}

/// POST /gm/verify
pub async fn verify_gm(
    State(state): State<AppState>,
    Json(request): Json<GmVerifyRequest>,
) -> Result<Json<GmVerifyResponse>> {
    let is_valid = state.treasury.verify(&request)?;
    Ok(Json(GmVerifyResponse { is_valid }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::test_support::default_state, error::AppError};

    #[tokio::test]
    async fn issued_proof_round_trips_through_verify() {
        let state = default_state();
        let Json(proof) = gm_proof(State(state.clone())).await.unwrap();
        assert!(proof.message.starts_with("gm"));
        assert_eq!(proof.address, state.treasury.address_checksum());

        let Json(result) = verify_gm(
            State(state),
            Json(GmVerifyRequest {
                address: Some(proof.address),
                message: Some(proof.message),
                signature: Some(proof.signature),
            }),
        )
        .await
        .unwrap();
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn tampered_message_does_not_verify() {
        let state = default_state();
        let Json(proof) = gm_proof(State(state.clone())).await.unwrap();
        let Json(result) = verify_gm(
            State(state),
            Json(GmVerifyRequest {
                address: Some(proof.address),
                message: Some("gm0".to_string()),
                signature: Some(proof.signature),
            }),
        )
        .await
        .unwrap();
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let err = verify_gm(State(default_state()), Json(GmVerifyRequest::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
