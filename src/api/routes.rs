use crate::api::{handlers, AppState};
use crate::metrics::MetricsLayer;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Guided tour
        .route("/v1/tour/start", post(handlers::start_tour))
        .route("/v1/tour/next", post(handlers::next_step))
        .route("/v1/tour/previous", post(handlers::previous_step))
        .route("/v1/tour/go-to-step", post(handlers::go_to_step))
        .route("/v1/tour/navigate", post(handlers::navigate_to_page))
        .route("/v1/tour/progress", get(handlers::tour_progress))
        .route("/v1/tour/steps", get(handlers::tour_steps))
        .route("/v1/tour/analytics", get(handlers::tour_analytics))
        .route("/v1/tour/quiz-answer", post(handlers::answer_quiz))
        .route("/v1/user/points", get(handlers::user_points))
        // Content
        .route("/v1/content/:content_type/:id", get(handlers::get_content))
        .route("/v1/search", get(handlers::search))
        // Concierge
        .route("/v1/chat", post(handlers::chat))
        .route("/v1/chat/more", post(handlers::more_info))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(MetricsLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(cors)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
