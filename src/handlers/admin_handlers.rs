use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use crate::config::session::ADMIN_USERNAME_KEY;
use crate::error::{AppError, Result};
use crate::handlers::JsonOrForm;
use crate::models::{CampaignDetails, CreateCampaignRequest, UserDetails};
use crate::services::{
    campaign_service, user_service, AdminAuthError, AdminLoginRequest, CampaignPage,
    DashboardStats, UserPage,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    JsonOrForm(form): JsonOrForm<AdminLoginForm>,
) -> Result<Response> {
    let request = AdminLoginRequest {
        username: form.username,
        password: form.password,
    };

    let username = app_state
        .admin_auth
        .clone()
        .verify(request)
        .await
        .map_err(|e| match e {
            AdminAuthError::InvalidCredentials => AppError::InvalidCredentials,
            other => AppError::Internal(other.to_string()),
        })?;

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session: {}", e)))?;
    session
        .insert(ADMIN_USERNAME_KEY, &username)
        .await
        .map_err(|e| AppError::Internal(format!("session: {}", e)))?;

    tracing::info!(username = %username, "admin logged in");
    Ok(Json(json!({ "success": true, "username": username })).into_response())
}

pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(json!({ "success": true }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(Envelope {
        success: true,
        data,
    })
    .into_response()
}

pub async fn dashboard(State(app_state): State<AppState>) -> Result<Response> {
    let stats: DashboardStats = app_state.dashboard.stats().await?;
    Ok(ok(stats))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

pub async fn list_users(
    State(app_state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Response> {
    let page: UserPage = app_state
        .users
        .list(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(user_service::DEFAULT_PAGE_SIZE),
            query.search,
        )
        .await?;
    Ok(ok(page))
}

pub async fn get_user(State(app_state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let details: UserDetails = app_state.users.details(id).await?;
    Ok(ok(json!({ "user": details })))
}

#[derive(Debug, Deserialize)]
pub struct CampaignListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_campaigns(
    State(app_state): State<AppState>,
    Query(query): Query<CampaignListQuery>,
) -> Result<Response> {
    let page: CampaignPage = app_state
        .campaigns
        .list(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(campaign_service::DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(ok(page))
}

pub async fn create_campaign(
    State(app_state): State<AppState>,
    session: Session,
    JsonOrForm(request): JsonOrForm<CreateCampaignRequest>,
) -> Result<Response> {
    let created_by = session.get::<String>(ADMIN_USERNAME_KEY).await.ok().flatten();
    let campaign = app_state.campaigns.create(request, created_by).await?;
    Ok(ok(json!({ "campaign": campaign })))
}

pub async fn get_campaign(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let details: CampaignDetails = app_state.campaigns.get(id).await?;
    Ok(ok(json!({ "campaign": details })))
}

pub async fn execute_campaign(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let summary = app_state.campaigns.execute(id).await?;
    Ok(ok(summary))
}
