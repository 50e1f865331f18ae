use axum::{extract::State, Json};
use chrono::Utc;

use crate::{error::Result, models::WithdrawResponse};

use super::AppState;

/// GET /withdraw
pub async fn withdraw(State(state): State<AppState>) -> Result<Json<WithdrawResponse>> {
    let hash = state.treasury.withdraw(Utc::now()).await?;
    tracing::info!("Treasury withdrawal submitted: {}", hash);
    Ok(Json(WithdrawResponse { hash }))
}
