use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeader;

use crate::config::{HASHED_ASSET_CACHE_CONTROL, INDEX_CACHE_CONTROL, STATIC_CACHE_CONTROL};
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    // Unknown client-side routes (e.g. /county/nairobi) get the SPA shell,
    // which must never be cached under the client route's path.
    let index_fallback = SetResponseHeader::overriding(
        ServeFile::new(state.static_dir.join("index.html")),
        header::CACHE_CONTROL,
        HeaderValue::from_static(INDEX_CACHE_CONTROL),
    );
    let spa = Router::new()
        .fallback_service(
            ServeDir::new(&state.static_dir)
                .precompressed_br()
                .precompressed_gzip()
                .fallback(index_fallback),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .route("/ping", get(routes::api::ping))
        .route("/api/health", get(routes::api::health))
        .route("/api/map.svg", get(routes::api::map_svg))
        .route("/api/map", get(routes::api::map_data))
        .route("/api/rankings", get(routes::api::rankings))
        .route("/api", any(routes::api::api_not_found))
        .route("/api/{*path}", any(routes::api::api_not_found));

    app.layer(CompressionLayer::new())
        .layer(cors)
        .fallback_service(spa)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success() && !response.headers().contains_key(header::CACHE_CONTROL)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control_for(&path)),
        );
    }

    response
}

fn cache_control_for(path: &str) -> &'static str {
    if path == "/" || path.ends_with("/index.html") {
        return INDEX_CACHE_CONTROL;
    }

    if path.starts_with("/assets/") {
        return HASHED_ASSET_CACHE_CONTROL;
    }

    STATIC_CACHE_CONTROL
}
