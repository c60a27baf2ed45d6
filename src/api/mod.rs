//! HTTP boundary: routing, bearer extraction and the JSON envelope.

pub mod auth;
mod error;
pub mod handlers;
pub mod response;

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::constructors::App;

pub type AppState = Arc<App>;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, Default)]
struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4()
            .to_string()
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

pub fn router(app: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let v1 = Router::new()
        .route("/signin", post(handlers::user::sign_in))
        .route(
            "/user/me",
            get(handlers::user::me).patch(handlers::user::update_me),
        )
        .route(
            "/user/follow",
            post(handlers::friendship::follow).delete(handlers::friendship::unfollow),
        )
        .route("/user/:uid", get(handlers::user::find))
        .route("/user/:uid/friendship", get(handlers::friendship::list))
        .route("/user/:uid/status", get(handlers::status::list_by_user))
        .route("/timeline/me", get(handlers::status::timeline))
        .route("/status", post(handlers::status::create))
        .route("/status/recommend", get(handlers::status::recommend))
        .route(
            "/status/:id",
            get(handlers::status::find).delete(handlers::status::remove),
        )
        .route(
            "/status/:id/like",
            post(handlers::status::like).delete(handlers::status::unlike),
        )
        .route(
            "/comment",
            get(handlers::status::list_comments).post(handlers::status::create_comment),
        )
        .route("/attachment", post(handlers::attachment::upload));

    Router::new()
        .route("/", get(handlers::probe))
        .route("/healthz", get(handlers::probe))
        .nest("/api/v1", v1)
        .with_state(app)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();

                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id, RequestUuid))
        .layer(CorsLayer::permissive())
}

/// Serves `app` until `shutdown` resolves.
pub async fn start_api_server(
    config: &Config,
    app: App,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, router(Arc::new(app)).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
