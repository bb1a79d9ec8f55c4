use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use reel_planner::advisor;
use reel_planner::catalog;
use reel_planner::config::MachineConfig;
use reel_planner::error::Error;
use reel_planner::planner::{Planner, ProductionPlan};
use reel_planner::types::{
    BoxSpec, FoldedDims, ProductionRequest, QuantitySuggestion, ReelChoice, ReelProfile,
    deserialize_u32_from_number,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// A box either by folded dimensions or by flattened plate, in mm.
#[derive(Deserialize, Serialize)]
struct BoxRequest {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    folded: Option<FoldedDims>,
    #[serde(default)]
    plate_length: Option<u32>,
    #[serde(default)]
    plate_height: Option<u32>,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    quantity: u32,
}

#[derive(Deserialize, Serialize, Default)]
struct ReelOverrides {
    #[serde(default)]
    wide_usable: Option<u32>,
    #[serde(default)]
    narrow_usable: Option<u32>,
}

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    boxes: Vec<BoxRequest>,
    #[serde(default)]
    reels: ReelOverrides,
    #[serde(default)]
    reel: Option<String>,
    /// Only the pass cap is client-tunable; machine limits stay fixed.
    #[serde(default)]
    max_passes: Option<usize>,
}

#[derive(Deserialize, Serialize)]
struct SuggestRequest {
    #[serde(flatten)]
    item: BoxRequest,
    #[serde(default)]
    reels: ReelOverrides,
}

#[derive(Serialize)]
struct CatalogResponse {
    boxes: Vec<BoxSpec>,
    reels: Vec<ReelProfile>,
}

type ApiError = (StatusCode, String);

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn reels_from(overrides: &ReelOverrides) -> Vec<ReelProfile> {
    catalog::standard_reels()
        .into_iter()
        .map(|mut reel| {
            let custom = if reel.id.as_str() == catalog::WIDE_REEL {
                overrides.wide_usable
            } else {
                overrides.narrow_usable
            };
            if let Some(usable) = custom {
                reel.usable = usable;
            }
            reel
        })
        .collect()
}

fn box_spec(req: &BoxRequest, config: &MachineConfig) -> Result<BoxSpec, Error> {
    let name = req.name.clone().unwrap_or_else(|| req.id.clone());
    match (req.folded, req.plate_length, req.plate_height) {
        (Some(folded), _, _) => BoxSpec::from_folded(req.id.clone(), name, folded, config),
        (None, Some(length), Some(height)) => {
            BoxSpec::from_plate(req.id.clone(), name, length, height, config)
        }
        _ => Err(Error::InvalidDimension(format!(
            "box {} needs folded dimensions or plate_length and plate_height",
            req.id
        ))),
    }
}

async fn list_catalog() -> Result<Json<CatalogResponse>, ApiError> {
    let boxes = catalog::standard_boxes(&MachineConfig::default()).map_err(bad_request)?;
    Ok(Json(CatalogResponse {
        boxes,
        reels: catalog::standard_reels(),
    }))
}

async fn optimize(Json(req): Json<OptimizeRequest>) -> Result<Json<ProductionPlan>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let choice = match req.reel.as_deref() {
        None => ReelChoice::Auto,
        Some(s) => s.parse::<ReelChoice>().map_err(bad_request)?,
    };

    let config = MachineConfig {
        max_passes: req
            .max_passes
            .unwrap_or(reel_planner::config::DEFAULT_MAX_PASSES),
        ..MachineConfig::default()
    };
    let boxes: Vec<BoxSpec> = req
        .boxes
        .iter()
        .map(|b| box_spec(b, &config))
        .collect::<Result<Vec<_>, _>>()
        .map_err(bad_request)?;
    let requests: Vec<ProductionRequest> = req
        .boxes
        .iter()
        .map(|b| ProductionRequest::new(b.id.clone(), b.quantity))
        .collect();
    let planner = Planner::new(reels_from(&req.reels), config).map_err(bad_request)?;

    // The search is CPU-bound; keep it off the async workers
    let plan = tokio::task::spawn_blocking(move || planner.plan(&boxes, &requests, &choice))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(bad_request)?;

    Ok(Json(plan))
}

async fn suggest(
    Json(req): Json<SuggestRequest>,
) -> Result<Json<Vec<QuantitySuggestion>>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /suggest"
    );

    let config = MachineConfig::default();
    let spec = box_spec(&req.item, &config).map_err(bad_request)?;
    let reels = reels_from(&req.reels);
    // Validates the overrides the same way a full plan would
    Planner::new(reels.clone(), config).map_err(bad_request)?;

    Ok(Json(advisor::suggest(&spec, req.item.quantity, &reels, &config)))
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/catalog", get(list_catalog))
        .route("/optimize", post(optimize))
        .route("/suggest", post(suggest))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
