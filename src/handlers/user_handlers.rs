use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::Result;
use crate::AppState;

pub async fn profile(
    State(app_state): State<AppState>,
    Path(login_id): Path<String>,
) -> Result<Response> {
    let profile = app_state.users.profile(&login_id).await?;
    Ok(Json(json!({ "success": true, "profile": profile })).into_response())
}

pub async fn subscriptions(
    State(app_state): State<AppState>,
    Path(login_id): Path<String>,
) -> Result<Response> {
    let subscriptions = app_state.users.subscriptions(&login_id).await?;
    Ok(Json(json!({ "success": true, "subscriptions": subscriptions })).into_response())
}

pub async fn revoke(
    State(app_state): State<AppState>,
    Path(login_id): Path<String>,
) -> Result<Response> {
    app_state.users.revoke(&login_id).await?;
    Ok(Json(json!({ "success": true, "message": "Authorization revoked" })).into_response())
}
