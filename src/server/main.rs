//! HTTP server for region lookups.
//!
//! Provides reverse lookup, child listing and region centroid/elevation
//! endpoints over a GeoPackage admin boundary dataset.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wilayah::config::ServiceConfig;
use wilayah::elevation::GoogleElevationClient;
use wilayah::{AdminEntry, AdminHierarchy, LookupError, NodeInfo, RegionService};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const CACHE_CONTROL: &str = "public, max-age=2592000, stale-if-error=2592000";

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Administrative region lookup server")]
struct Args {
    /// TOML config file; flags and environment override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "ADDR")]
    listen: Option<String>,

    /// GeoPackage file with the region table
    #[arg(long, env = "GPKG_PATH")]
    gpkg_path: Option<PathBuf>,

    /// Region table name
    #[arg(long, env = "GPKG_TABLE")]
    table: Option<String>,

    /// Geometry column name
    #[arg(long, env = "GPKG_GEOM_COL")]
    geom_column: Option<String>,

    /// Decimal places query points are rounded to (0-6)
    #[arg(long, env = "ROUND_PLACES")]
    round_places: Option<u32>,

    /// Elevation cache directory
    #[arg(long, env = "ELEVATION_DB_PATH")]
    elevation_db_path: Option<PathBuf>,

    /// Google Maps API key for elevation lookups
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// Code used when `/children` or `/latlng` get none
    #[arg(long, env = "GPKG_PARENT_CODE")]
    default_parent_code: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load_from_file(path)
                .with_context(|| format!("Loading {}", path.display()))?,
            None => ServiceConfig::default(),
        };

        if let Some(v) = self.listen {
            config.listen = v;
        }
        if let Some(v) = self.gpkg_path {
            config.gpkg_path = v;
        }
        if let Some(v) = self.table {
            config.table = v;
        }
        if let Some(v) = self.geom_column {
            config.geom_column = v;
        }
        if let Some(v) = self.round_places {
            config.round_places = v;
        }
        if let Some(v) = self.elevation_db_path {
            config.elevation_db_path = v;
        }
        if let Some(v) = self.google_api_key {
            config.google_api_key = Some(v);
        }
        if let Some(v) = self.default_parent_code {
            config.default_parent_code = v;
        }
        Ok(config)
    }
}

/// Application state shared across handlers
struct AppState {
    service: RegionService<GoogleElevationClient>,
    default_parent_code: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Args::parse().into_config()?;

    info!("Wilayah Region Server");
    if config.google_api_key.is_none() {
        info!("No elevation API key configured; uncached elevations will be 0");
    }

    let service = RegionService::open(&config).context("Failed to open region service")?;

    let state = Arc::new(AppState {
        service,
        default_parent_code: config.default_parent_code.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/reverse", get(reverse_handler))
        .route("/children", get(children_handler))
        .route("/latlng", get(latlng_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", config.listen);
    info!(
        "Try http://{}/reverse?latitude=-6.193835958650485&longitude=106.79943779288192",
        config.listen
    );

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Response envelope shared by every endpoint
#[derive(Serialize)]
struct ApiResponse<T> {
    code: u16,
    msg: String,
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Json<Self> {
        Json(Self {
            code: 200,
            msg: "success".to_string(),
            data: Some(data),
        })
    }
}

struct ApiError {
    status: StatusCode,
    msg: String,
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            msg: msg.into(),
        }
    }

    fn from_lookup(err: LookupError, context: &str) -> Self {
        if err.is_not_found() {
            return Self {
                status: StatusCode::NOT_FOUND,
                msg: "not found".to_string(),
            };
        }
        error!("{} error: {}", context, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            msg: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse {
            code: self.status.as_u16(),
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "ok"
}

#[derive(Deserialize, Default)]
struct ReverseQueryParams {
    latitude: Option<String>,
    longitude: Option<String>,
    /// "lat,lon"
    latlng: Option<String>,
}

/// Reverse lookup: region hierarchy containing a point
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQueryParams>,
) -> Result<Json<ApiResponse<AdminHierarchy>>, ApiError> {
    let (lat, lon) = parse_lat_lon(&params).map_err(ApiError::bad_request)?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::bad_request("lat/lon out of range"));
    }

    let hierarchy = state
        .service
        .reverse_lookup(lat, lon)
        .await
        .map_err(|e| ApiError::from_lookup(e, "reverse"))?;

    Ok(ApiResponse::success(hierarchy))
}

#[derive(Deserialize)]
struct ChildrenQueryParams {
    parent_code: Option<String>,
}

#[derive(Serialize)]
struct ChildrenList {
    list: Vec<AdminEntry>,
}

/// Direct children of a region
async fn children_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChildrenQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let code = code_or_default(params.parent_code, &state.default_parent_code);

    let list = match state.service.children_of(&code).await {
        Ok(list) => list,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(ApiError::from_lookup(e, "children")),
    };

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL)],
        ApiResponse::success(ChildrenList { list }),
    ))
}

#[derive(Deserialize)]
struct LatlngQueryParams {
    code: Option<String>,
}

/// Centroid and elevation of a region
async fn latlng_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatlngQueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let code = code_or_default(params.code, &state.default_parent_code);

    let info: NodeInfo = state
        .service
        .node_info(&code)
        .await
        .map_err(|e| ApiError::from_lookup(e, "latlng"))?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL)],
        ApiResponse::success(info),
    ))
}

fn code_or_default(code: Option<String>, default: &str) -> String {
    code.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Accepts `latlng=lat,lon` or separate `latitude` / `longitude`.
fn parse_lat_lon(params: &ReverseQueryParams) -> std::result::Result<(f64, f64), String> {
    if let Some(ll) = params.latlng.as_deref().filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = ll.split(',').collect();
        if parts.len() != 2 {
            return Err("invalid latlng, use 'lat,lon'".to_string());
        }
        return match (parts[0].trim().parse(), parts[1].trim().parse()) {
            (Ok(lat), Ok(lon)) => Ok((lat, lon)),
            _ => Err("invalid latlng values".to_string()),
        };
    }

    let (Some(lat), Some(lon)) = (
        params.latitude.as_deref().filter(|s| !s.is_empty()),
        params.longitude.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err("latitude/longitude or latlng are required".to_string());
    };

    match (lat.trim().parse(), lon.trim().parse()) {
        (Ok(lat), Ok(lon)) => Ok((lat, lon)),
        _ => Err("invalid latitude/longitude values".to_string()),
    }
}
