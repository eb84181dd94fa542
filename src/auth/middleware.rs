use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::config::session::ADMIN_USERNAME_KEY;
use crate::error::AppError;

pub async fn require_admin(session: Session, request: Request, next: Next) -> Response {
    if let Ok(Some(_username)) = session.get::<String>(ADMIN_USERNAME_KEY).await {
        next.run(request).await
    } else {
        AppError::AuthenticationRequired.into_response()
    }
}
