use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BOUNDARY_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/abugasavio/ke.counties/master/counties.geojson";
pub const DEFAULT_PERFORMANCE_TABLE: &str = "county_summary_performance";
pub const DEFAULT_STATIC_DIR: &str = "spa";
pub const DEFAULT_PING_MESSAGE: &str = "ping";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

// Static asset caching
pub const INDEX_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";
pub const HASHED_ASSET_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
pub const STATIC_CACHE_CONTROL: &str = "public, max-age=604800";

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn static_dir() -> PathBuf {
    non_empty_env("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

/// Health-check reply for `/ping`. An empty value is a valid message here.
pub fn ping_message() -> String {
    std::env::var("PING_MESSAGE").unwrap_or_else(|_| DEFAULT_PING_MESSAGE.to_owned())
}

pub fn boundary_geojson_url() -> String {
    non_empty_env("BOUNDARY_GEOJSON_URL")
        .unwrap_or_else(|| DEFAULT_BOUNDARY_GEOJSON_URL.to_owned())
}

/// Base URL of the hosted database project. Without it every performance
/// lookup resolves to "no data".
pub fn supabase_url() -> Option<String> {
    non_empty_env("SUPABASE_URL")
        .or_else(|| non_empty_env("VITE_SUPABASE_URL"))
        .map(|url| url.trim_end_matches('/').to_owned())
}

pub fn supabase_anon_key() -> Option<String> {
    non_empty_env("SUPABASE_ANON_KEY").or_else(|| non_empty_env("VITE_SUPABASE_ANON_KEY"))
}

pub fn performance_table() -> String {
    non_empty_env("PERFORMANCE_TABLE").unwrap_or_else(|| DEFAULT_PERFORMANCE_TABLE.to_owned())
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}
