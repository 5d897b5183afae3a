use std::sync::{Arc, Weak};

use ndc_shared::{BoundaryCollection, BoundaryStatus};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::services::FetchError;

/// Fetch the county boundaries once and publish the outcome.
///
/// There is no retry: a failure stays in the cell until the process restarts.
/// Only a weak handle to the cell is held so a result that arrives after the
/// owning state is gone is dropped instead of applied.
pub async fn run(cell: Weak<RwLock<BoundaryStatus>>, client: reqwest::Client, url: String) {
    let result = fetch_boundaries(&client, &url).await;
    match &result {
        Ok(collection) => info!(counties = collection.len(), %url, "loaded county boundaries"),
        Err(e) => error!(error = %e, %url, "failed to load county boundaries"),
    }

    if !publish(&cell, result).await {
        debug!("boundary state dropped before fetch completed; discarding result");
    }
}

pub async fn fetch_boundaries(
    client: &reqwest::Client,
    url: &str,
) -> Result<BoundaryCollection, FetchError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }
    let body = resp.bytes().await?;
    Ok(BoundaryCollection::from_geojson_slice(&body)?)
}

/// Store a fetch outcome if the cell still exists. Returns `false` when late.
pub async fn publish(
    cell: &Weak<RwLock<BoundaryStatus>>,
    result: Result<BoundaryCollection, FetchError>,
) -> bool {
    let Some(cell) = cell.upgrade() else {
        return false;
    };
    *cell.write().await = match result {
        Ok(collection) => BoundaryStatus::Ready(Arc::new(collection)),
        Err(e) => BoundaryStatus::Failed(e.to_string()),
    };
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use ndc_shared::{BoundaryCollection, BoundaryStatus};
    use tokio::sync::RwLock;

    use super::{fetch_boundaries, publish, run};
    use crate::services::FetchError;

    const GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
        {"properties":{"COUNTY":"Nyeri","OBJECTID":3},
         "geometry":{"type":"Polygon","coordinates":[[[36.8,-0.6],[37.2,-0.6],[37.0,-0.2]]]}}
    ]}"#;

    async fn spawn_upstream(router: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream listener");
        let addr = listener.local_addr().expect("upstream address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve upstream");
        });
        (format!("http://{addr}/counties.geojson"), handle)
    }

    #[tokio::test]
    async fn publishes_ready_collection() {
        let (url, upstream) =
            spawn_upstream(Router::new().route("/counties.geojson", get(|| async { GEOJSON })))
                .await;
        let cell = Arc::new(RwLock::new(BoundaryStatus::Loading));

        run(Arc::downgrade(&cell), reqwest::Client::new(), url).await;

        match &*cell.read().await {
            BoundaryStatus::Ready(collection) => {
                assert_eq!(collection.len(), 1);
                assert_eq!(collection.features[0].name, "Nyeri");
            }
            other => panic!("expected ready boundaries, got {other:?}"),
        }
        upstream.abort();
    }

    #[tokio::test]
    async fn non_success_and_malformed_bodies_fail() {
        let (url, upstream) = spawn_upstream(
            Router::new()
                .route(
                    "/counties.geojson",
                    get(|| async { (StatusCode::NOT_FOUND, "missing") }),
                )
                .route("/broken.geojson", get(|| async { "<html>" })),
        )
        .await;
        let client = reqwest::Client::new();

        let missing = fetch_boundaries(&client, &url).await;
        assert!(matches!(missing, Err(FetchError::Status(status)) if status == StatusCode::NOT_FOUND));

        let broken_url = url.replace("counties", "broken");
        let broken = fetch_boundaries(&client, &broken_url).await;
        assert!(matches!(broken, Err(FetchError::Boundary(_))));

        let cell = Arc::new(RwLock::new(BoundaryStatus::Loading));
        run(Arc::downgrade(&cell), client, broken_url).await;
        assert!(matches!(&*cell.read().await, BoundaryStatus::Failed(_)));
        upstream.abort();
    }

    #[tokio::test]
    async fn late_result_is_discarded_once_state_is_dropped() {
        let cell = Arc::new(RwLock::new(BoundaryStatus::Loading));
        let weak = Arc::downgrade(&cell);
        drop(cell);

        assert!(!publish(&weak, Ok(BoundaryCollection::default())).await);
    }
}
