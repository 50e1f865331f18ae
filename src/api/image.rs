use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::ImageResponse,
    services::{
        image_generator::{build_prompt, words_for_selection},
        selection::Selection,
    },
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ImageQuery {
    pub idx: Option<String>,
}

impl ImageQuery {
    pub fn selection(&self) -> Result<Selection> {
        let raw = self.idx.as_deref().ok_or_else(|| {
            AppError::BadRequest(
                "Missing required query parameter: idx (e.g., idx=1,2 or idx=1,2,3,4,5)"
                    .to_string(),
            )
        })?;
        Ok(Selection::parse(raw)?)
    }
}

/// GET /image?idx=1,2,3
///
/// Runs behind the payment gate, so by the time this executes the payment has been verified.
pub async fn generate_image(
    State(state): State<AppState>,
    query: std::result::Result<Query<ImageQuery>, QueryRejection>,
) -> Result<Json<ImageResponse>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let selection = query.selection()?;
    let words = words_for_selection(&state.config.mnemonic, &selection)?;
    let prompt = build_prompt(&words);

    tracing::debug!("Generating image for indices [{}]", selection);

    let base64 = state
        .generator
        .generate(&prompt)
        .await?
        .ok_or(AppError::NoImageGenerated)?;

    Ok(Json(ImageResponse {
        indices: selection.indices().to_vec(),
        base64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{default_state, state_with, StubFacilitator, StubGenerator};
    use std::sync::Arc;

    fn query(idx: Option<&str>) -> std::result::Result<Query<ImageQuery>, QueryRejection> {
        Ok(Query(ImageQuery {
            idx: idx.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn returns_indices_and_image() {
        let Json(body) = generate_image(State(default_state()), query(Some("3,1")))
            .await
            .unwrap();
        assert_eq!(body.indices, vec![3, 1]);
        assert_eq!(body.base64, "/9j/4AAQ");
    }

    #[tokio::test]
    async fn missing_idx_is_bad_request() {
        let err = generate_image(State(default_state()), query(None))
            .await
            .unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert!(msg.starts_with("Missing required query parameter: idx")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_without_image_is_reported() {
        let state = state_with(
            StubGenerator {
                image: None,
                fail: false,
            },
            Arc::new(StubFacilitator::default()),
        );
        let err = generate_image(State(state), query(Some("1,2")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoImageGenerated));
    }
}
