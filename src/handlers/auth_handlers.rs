use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::config::session::{LOGIN_ID_KEY, OAUTH_STATE_KEY};
use crate::error::{AppError, Result};
use crate::handlers::{public_base_url, wants_json};
use crate::models::AuthorizationStatus;
use crate::services::LoginLink;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateLinkQuery {
    #[serde(default)]
    pub master: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkResponse {
    success: bool,
    #[serde(flatten)]
    link: LoginLink,
}

pub async fn generate_link(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GenerateLinkQuery>,
) -> Result<Response> {
    let base_url = public_base_url(&app_state.settings, &headers);
    let link = if query.master {
        app_state.login_links.generate_master_link(&base_url).await?
    } else {
        app_state.login_links.generate_link(&base_url).await?
    };

    Ok(Json(LinkResponse {
        success: true,
        link,
    })
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsentResponse {
    success: bool,
    login_id: String,
    auth_url: String,
}

/// Starts consent for a login link and remembers which identity it is for.
pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(login_id): Path<String>,
) -> Result<Response> {
    let start = app_state.login_links.begin_login(&login_id).await?;

    session
        .insert(LOGIN_ID_KEY, &start.login_id)
        .await
        .map_err(|e| AppError::Internal(format!("session: {}", e)))?;
    session
        .insert(OAUTH_STATE_KEY, &start.state)
        .await
        .map_err(|e| AppError::Internal(format!("session: {}", e)))?;

    if wants_json(&headers) {
        Ok(Json(ConsentResponse {
            success: true,
            login_id: start.login_id,
            auth_url: start.auth_url,
        })
        .into_response())
    } else {
        Ok(Redirect::to(&start.auth_url).into_response())
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackResponse {
    success: bool,
    login_id: String,
    name: Option<String>,
}

pub async fn youtube_callback(
    State(app_state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "consent was not granted");
        return Err(AppError::Validation(format!("Authorization failed: {}", error)));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::Validation("Missing authorization code".to_string()))?;

    let expected_state = session
        .remove::<String>(OAUTH_STATE_KEY)
        .await
        .ok()
        .flatten();
    if expected_state.is_none() || expected_state != query.state {
        return Err(AppError::Validation("Invalid OAuth state".to_string()));
    }

    let login_id = session
        .get::<String>(LOGIN_ID_KEY)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::Validation("No login in progress".to_string()))?;

    let user = app_state.login_links.complete_login(&login_id, &code).await?;

    // The session follows the record that now holds the credentials.
    session
        .insert(LOGIN_ID_KEY, &user.login_id)
        .await
        .map_err(|e| AppError::Internal(format!("session: {}", e)))?;

    if wants_json(&headers) {
        return Ok(Json(CallbackResponse {
            success: true,
            login_id: user.login_id,
            name: user.name,
        })
        .into_response());
    }

    let target = &app_state.settings.auth_success_redirect;
    let separator = if target.contains('?') { '&' } else { '?' };
    Ok(Redirect::to(&format!("{}{}loginId={}", target, separator, user.login_id)).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    success: bool,
    #[serde(flatten)]
    status: AuthorizationStatus,
}

pub async fn status(
    State(app_state): State<AppState>,
    Path(login_id): Path<String>,
) -> Result<Response> {
    let status = app_state.users.status(&login_id).await?;
    Ok(Json(StatusResponse {
        success: true,
        status,
    })
    .into_response())
}
