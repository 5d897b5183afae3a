use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ndc_shared::BoundaryStatus;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{
    performance_table, ping_message, static_dir, supabase_anon_key, supabase_url,
    upstream_connect_timeout, upstream_http_timeout,
};
use crate::services::performance::{PerformanceSource, RestPerformanceSource};

#[derive(Clone)]
pub struct AppState {
    /// County boundaries, filled once by the boundary loader.
    pub boundaries: Arc<RwLock<BoundaryStatus>>,
    pub performance: Arc<dyn PerformanceSource>,
    pub http_client: reqwest::Client,
    /// Boundary download client. Only connecting is bounded: a slow
    /// download keeps the map loading rather than failing it for good.
    pub boundary_client: reqwest::Client,
    pub static_dir: PathBuf,
    pub ping_message: String,
}

impl AppState {
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let http_client = build_http_client(Some(upstream_http_timeout()))?;
        let boundary_client = build_http_client(None)?;
        let performance = RestPerformanceSource::new(
            http_client.clone(),
            supabase_url(),
            supabase_anon_key(),
            performance_table(),
        );
        let mut state = Self::new(
            http_client,
            Arc::new(performance),
            static_dir(),
            ping_message(),
        );
        state.boundary_client = boundary_client;
        Ok(state)
    }

    pub fn new(
        http_client: reqwest::Client,
        performance: Arc<dyn PerformanceSource>,
        static_dir: PathBuf,
        ping_message: String,
    ) -> Self {
        Self {
            boundaries: Arc::new(RwLock::new(BoundaryStatus::Loading)),
            performance,
            boundary_client: http_client.clone(),
            http_client,
            static_dir,
            ping_message,
        }
    }
}

fn build_http_client(request_timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    let connect_timeout = upstream_connect_timeout();
    let builder = || {
        let builder = reqwest::Client::builder().connect_timeout(connect_timeout);
        match request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    };
    builder()
        .user_agent("ndc-tracker/0.1")
        .build()
        .or_else(|e| {
            warn!(
                error = %e,
                "failed to build configured HTTP client, retrying without custom user-agent"
            );
            builder().build()
        })
}
