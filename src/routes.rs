use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::require_admin;
use crate::config::session::{is_production, SessionLayer};
use crate::handlers::{admin_handlers, auth_handlers, user_handlers};
use crate::AppState;

pub fn app(app_state: AppState, session_layer: SessionLayer) -> Router {
    let cors_origin = app_state.settings.cors_allowed_origin.clone();

    let admin_routes = Router::new()
        .route("/dashboard", get(admin_handlers::dashboard))
        .route("/users", get(admin_handlers::list_users))
        .route("/users/{id}", get(admin_handlers::get_user))
        .route(
            "/campaigns",
            get(admin_handlers::list_campaigns).post(admin_handlers::create_campaign),
        )
        .route("/campaigns/{id}", get(admin_handlers::get_campaign))
        .route(
            "/campaigns/{id}/execute",
            post(admin_handlers::execute_campaign),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route("/login", post(admin_handlers::login))
        .route("/logout", get(admin_handlers::logout).post(admin_handlers::logout));

    let auth_routes = Router::new()
        .route("/generate-link", get(auth_handlers::generate_link))
        .route("/login/{login_id}", get(auth_handlers::login))
        .route("/youtube/callback", get(auth_handlers::youtube_callback))
        .route("/status/{login_id}", get(auth_handlers::status));

    let user_routes = Router::new()
        .route("/profile/{login_id}", get(user_handlers::profile))
        .route("/subscriptions/{login_id}", get(user_handlers::subscriptions))
        .route("/revoke/{login_id}", post(user_handlers::revoke));

    let mut app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .nest("/user", user_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(add_security_headers))
                .layer(session_layer),
        )
        .with_state(app_state);

    if let Some(origin) = cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_credentials(true)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
                );
            }
            Err(e) => tracing::warn!(error = %e, "ignoring invalid CORS_ALLOWED_ORIGIN"),
        }
    }

    app
}

async fn add_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none';"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if is_production() {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
