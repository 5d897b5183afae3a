use axum::Json;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Datelike;
use ndc_shared::{
    BoundaryStatus, CountySummary, LegendEntry, MapOptions, MapRender, MapView, RankedCounty,
    ResolvedPerformance, Sector, legend, rank_counties,
};
use serde::{Deserialize, Serialize};

use crate::services::performance::resolve_performance;
use crate::state::AppState;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const LOADING_RETRY_AFTER_SECS: &str = "2";

#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub highlight: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MapPayload {
    pub sector: Sector,
    pub year: Option<i32>,
    pub view_box: String,
    pub counties: Vec<CountySummary>,
    pub legend: Vec<LegendEntry>,
}

#[derive(Debug, Serialize)]
pub struct RankingsPayload {
    pub sector: Sector,
    pub year: Option<i32>,
    pub counties: Vec<RankedCounty>,
}

pub async fn ping(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": state.ping_message }))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let boundaries = state.boundaries.read().await;
    let counties = match &*boundaries {
        BoundaryStatus::Ready(collection) => collection.len(),
        _ => 0,
    };
    Json(serde_json::json!({
        "status": "ok",
        "boundaries": boundaries.label(),
        "counties": counties,
    }))
}

pub async fn map_svg(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Response, StatusCode> {
    let view = load_view(&state, map_options(&query)?).await;

    Ok(match view.render() {
        MapRender::Svg(svg) => (
            [
                (header::CONTENT_TYPE, SVG_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            svg,
        )
            .into_response(),
        MapRender::Loading(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, LOADING_RETRY_AFTER_SECS)],
            message,
        )
            .into_response(),
        MapRender::Failed(message) => (StatusCode::BAD_GATEWAY, message).into_response(),
    })
}

pub async fn map_data(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Response, StatusCode> {
    let view = load_view(&state, map_options(&query)?).await;

    Ok(match view.render() {
        MapRender::Svg(_) => Json(MapPayload {
            sector: view.options().sector,
            year: view.performance_year(),
            view_box: view.view_box().to_string(),
            counties: view.counties(),
            legend: legend(),
        })
        .into_response(),
        MapRender::Loading(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, LOADING_RETRY_AFTER_SECS)],
            Json(serde_json::json!({ "status": "loading", "message": message })),
        )
            .into_response(),
        MapRender::Failed(message) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
    })
}

pub async fn rankings(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Json<RankingsPayload>, StatusCode> {
    let sector = parse_sector(query.sector.as_deref())?;
    let resolved =
        resolve_performance(state.performance.as_ref(), sector, query.year, current_year()).await;

    Ok(Json(RankingsPayload {
        sector,
        year: resolved.year,
        counties: rank_counties(&resolved.records),
    }))
}

pub async fn api_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn parse_sector(raw: Option<&str>) -> Result<Sector, StatusCode> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => raw.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(Sector::default()),
    }
}

fn map_options(query: &MapQuery) -> Result<MapOptions, StatusCode> {
    Ok(MapOptions {
        sector: parse_sector(query.sector.as_deref())?,
        year: query.year,
        highlight: query
            .highlight
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned),
    })
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Mount a fresh view for this request and feed it the current boundary
/// state plus a performance lookup for the requested sector/year.
async fn load_view(state: &AppState, options: MapOptions) -> MapView {
    let boundaries = state.boundaries.read().await.clone();
    let resolved = match boundaries {
        BoundaryStatus::Failed(_) => ResolvedPerformance::default(),
        _ => {
            resolve_performance(
                state.performance.as_ref(),
                options.sector,
                options.year,
                current_year(),
            )
            .await
        }
    };

    let mut view = MapView::new(options);
    let (boundary_ticket, performance_ticket) = view.mount();
    match boundaries {
        BoundaryStatus::Ready(collection) => {
            view.complete_boundaries(boundary_ticket, Ok(collection));
        }
        BoundaryStatus::Failed(reason) => {
            view.complete_boundaries(boundary_ticket, Err(reason));
        }
        BoundaryStatus::Loading => {}
    }
    view.complete_performance(performance_ticket, resolved);
    view
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use ndc_shared::{BoundaryCollection, BoundaryStatus, Sector};

    use super::{MapQuery, map_options, parse_sector};
    use crate::services::performance::testing::ScriptedSource;
    use crate::state::AppState;

    const GEOJSON: &[u8] = br#"{"type":"FeatureCollection","features":[
        {"properties":{"COUNTY":"Nairobi","OBJECTID":1},
         "geometry":{"type":"Polygon","coordinates":[[[36.65,-1.45],[37.1,-1.45],[37.1,-1.15],[36.65,-1.15]]]}},
        {"properties":{"COUNTY":"Kajiado","OBJECTID":2},
         "geometry":{"type":"Polygon","coordinates":[[[36.0,-3.2],[37.9,-3.2],[37.9,-1.4],[36.0,-1.4]]]}},
        {"properties":{"COUNTY":"Taita Taveta","OBJECTID":3},
         "geometry":{"type":"Polygon","coordinates":[[[37.6,-4.1],[39.2,-4.1],[39.2,-2.8],[37.6,-2.8]]]}}
    ]}"#;

    fn test_state(source: ScriptedSource, boundaries: BoundaryStatus) -> AppState {
        let state = AppState::new(
            reqwest::Client::new(),
            Arc::new(source),
            PathBuf::from("does-not-exist"),
            "pong".to_owned(),
        );
        *state.boundaries.try_write().expect("fresh boundary lock") = boundaries;
        state
    }

    fn ready_boundaries() -> BoundaryStatus {
        BoundaryStatus::Ready(Arc::new(
            BoundaryCollection::from_geojson_slice(GEOJSON).expect("fixture geojson"),
        ))
    }

    fn scripted() -> ScriptedSource {
        ScriptedSource::default()
            .with_rows(
                Sector::Water,
                2024,
                vec![("Nairobi City", 92.0), ("Kajiado", 58.5), ("Mombasa", 0.0)],
            )
            .with_rows(Sector::Waste, 2024, vec![("Taita Taveta", 76.0)])
    }

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    #[test]
    fn sector_defaults_to_water_and_rejects_unknown() {
        assert_eq!(parse_sector(None), Ok(Sector::Water));
        assert_eq!(parse_sector(Some("  ")), Ok(Sector::Water));
        assert_eq!(parse_sector(Some("Waste")), Ok(Sector::Waste));
        assert_eq!(parse_sector(Some("energy")), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn map_options_drop_blank_highlight() {
        let options = map_options(&MapQuery {
            highlight: Some("   ".to_owned()),
            ..MapQuery::default()
        })
        .expect("valid query");
        assert_eq!(options.highlight, None);
    }

    #[tokio::test]
    async fn ping_and_health_report_state() {
        let state = test_state(ScriptedSource::default(), ready_boundaries());
        let (addr, server_handle) = spawn_test_server(state).await;
        let client = reqwest::Client::new();

        let ping = client
            .get(format!("http://{addr}/ping"))
            .send()
            .await
            .expect("ping request")
            .json::<serde_json::Value>()
            .await
            .expect("parse ping");
        assert_eq!(ping["message"], "pong");

        let health = client
            .get(format!("http://{addr}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json::<serde_json::Value>()
            .await
            .expect("parse health");
        assert_eq!(health["status"], "ok");
        assert_eq!(health["boundaries"], "ready");
        assert_eq!(health["counties"], 3);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn map_svg_colors_joined_counties() {
        let state = test_state(scripted(), ready_boundaries());
        let (addr, server_handle) = spawn_test_server(state).await;

        let resp = reqwest::get(format!(
            "http://{addr}/api/map.svg?sector=water&year=2024&highlight=nairobi"
        ))
        .await
        .expect("map request");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("image/svg+xml")
        );
        let svg = resp.text().await.expect("svg body");

        assert_eq!(svg.matches("<path ").count(), 3);
        assert!(svg.contains(r##"fill="#22c55e""##));
        assert!(svg.contains(r##"fill="#ef4444""##));
        assert!(svg.contains(r##"fill="#cbd5e1""##));
        assert!(svg.contains(r#"href="/county/taita-taveta""#));
        assert_eq!(svg.matches(r#"opacity="0.3""#).count(), 2);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn map_reports_loading_and_terminal_failure() {
        let (addr, loading_handle) =
            spawn_test_server(test_state(scripted(), BoundaryStatus::Loading)).await;
        let loading = reqwest::get(format!("http://{addr}/api/map.svg"))
            .await
            .expect("loading request");
        assert_eq!(loading.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(loading.text().await.expect("body"), "Loading map...");
        loading_handle.abort();

        let source = scripted();
        let (addr, failed_handle) = spawn_test_server(test_state(
            source,
            BoundaryStatus::Failed("dns error".to_owned()),
        ))
        .await;
        let failed = reqwest::get(format!("http://{addr}/api/map"))
            .await
            .expect("failed request");
        assert_eq!(failed.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body = failed
            .json::<serde_json::Value>()
            .await
            .expect("error body");
        assert_eq!(body["error"], "Failed to load map data");
        failed_handle.abort();
    }

    #[tokio::test]
    async fn map_data_lists_counties_and_legend() {
        let state = test_state(scripted(), ready_boundaries());
        let (addr, server_handle) = spawn_test_server(state).await;

        let payload = reqwest::get(format!("http://{addr}/api/map?sector=waste&year=2024"))
            .await
            .expect("map data request")
            .error_for_status()
            .expect("map data status")
            .json::<serde_json::Value>()
            .await
            .expect("parse map data");

        assert_eq!(payload["sector"], "waste");
        assert_eq!(payload["year"], 2024);
        assert_eq!(payload["legend"].as_array().map(Vec::len), Some(4));
        let counties = payload["counties"].as_array().expect("counties array");
        assert_eq!(counties.len(), 3);
        assert_eq!(counties[2]["name"], "Taita Taveta");
        assert_eq!(counties[2]["tier"], "Satisfactory");
        assert_eq!(counties[0]["tier"], serde_json::Value::Null);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn rankings_sort_and_drop_zero_scores() {
        let state = test_state(scripted(), BoundaryStatus::Loading);
        let (addr, server_handle) = spawn_test_server(state).await;

        let payload = reqwest::get(format!("http://{addr}/api/rankings?year=2024"))
            .await
            .expect("rankings request")
            .error_for_status()
            .expect("rankings status")
            .json::<serde_json::Value>()
            .await
            .expect("parse rankings");

        let counties = payload["counties"].as_array().expect("counties array");
        assert_eq!(counties.len(), 2);
        assert_eq!(counties[0]["name"], "Nairobi City");
        assert_eq!(counties[0]["rank"], 1);
        assert_eq!(counties[0]["tier"], "Outstanding");
        assert_eq!(counties[1]["tier"], "Needs Improvement");

        let bad = reqwest::get(format!("http://{addr}/api/rankings?sector=energy"))
            .await
            .expect("bad rankings request");
        assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn unknown_api_paths_are_not_served_the_spa() {
        let state = test_state(ScriptedSource::default(), BoundaryStatus::Loading);
        let (addr, server_handle) = spawn_test_server(state).await;

        let resp = reqwest::get(format!("http://{addr}/api/nope"))
            .await
            .expect("unknown api request");
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server_handle.abort();
        let _ = server_handle.await;
    }
}
