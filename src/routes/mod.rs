use crate::models::AppState;
use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use http::{Request, Response, StatusCode};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::Any;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

mod api_routes;

/// Tabla de rutas del servicio con CORS, trazas y límite de tiempo por petición
pub fn init(state: AppState, request_timeout: Duration) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!("peticion", metodo = %request.method(), ruta = %request.uri().path())
        })
        .on_request(())
        .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
            tracing::info!(estado = %response.status(), "respondida en {} ms", latency.as_millis())
        })
        .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::warn!("respuesta fallida tras {} ms: {error}", latency.as_millis())
        });
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes::init(state))
        .layer(trace)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
