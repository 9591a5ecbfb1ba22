use crate::{
    config::RotatorConfig,
    pipeline::{ManualPosition, Pipeline, PipelineError},
    time::{Clock, time_of_day},
};
use antenna_controller::LinkError;
use axum::{
    Json, Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracking::{Pointing, catalog::Catalog, catalog::CatalogError};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// # API Documentation
///
/// `ApiDoc` generates the OpenAPI specification for the Ground Station API:
/// satellite pointing angles and manual control of the antenna rotator.
#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        list_satellites,
        get_satellite_data,
        connect,
        disconnect,
        status,
        set_position
    ),
    components(
        schemas(
            SatelliteRequest,
            PositionResponse,
            RotatorOutcome,
            SatellitesResponse,
            ConnectRequest,
            ConnectResponse,
            LinkStatus,
            PositionRequest,
            PositionAck,
            ErrorResponse
        )
    ),
    tags(
        (name = "Ground Station API", description = "Satellite pointing and antenna rotator control")
    )
)]
pub struct ApiDoc;

/// Everything a request handler needs. Owned by the router, never global.
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub catalog: Arc<Catalog>,
    pub clock: Arc<dyn Clock>,
    pub rotator: RotatorConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/satellites", get(list_satellites))
        .route("/get_satellite_data", post(get_satellite_data))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/status", get(status))
        .route("/set_position", post(set_position))
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Body(#[from] JsonRejection),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(PipelineError::Catalog(CatalogError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Body(_)
            | ApiError::Pipeline(
                PipelineError::Validation(_)
                | PipelineError::Detached
                | PipelineError::Link(LinkError::Unavailable | LinkError::Open { .. }),
            ) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Pipeline(PipelineError::Catalog(CatalogError::NotFound(_))) => {
                "Satellite not found".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[API] {}", self);
        } else {
            log::warn!("[API] {}", self);
        }

        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

/// `Json` whose rejections answer with the API's `{error}` body instead of
/// axum's plain-text one.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Satellite not found")]
    pub error: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SatelliteRequest {
    /// Exact catalog name of the satellite.
    #[schema(example = "ISS (ZARYA)")]
    pub satellite_name: String,
}

/// What happened to the pointing command, when a rotator is connected.
#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RotatorOutcome {
    Sent { command: String },
    Failed { error: String },
}

/// The satellite's current pointing angle, or why there is none.
#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PositionResponse {
    Visible {
        /// Degrees, rounded to two decimals.
        azimuth: f64,
        /// Degrees, rounded to two decimals.
        elevation: f64,
        #[schema(example = "14:05:09 UTC")]
        timestamp: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rotator: Option<RotatorOutcome>,
    },
    BelowHorizon {
        #[schema(example = "Satellite is below horizon")]
        error: String,
        timestamp: String,
    },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatellitesResponse {
    pub satellites: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
    #[schema(example = "/dev/ttyUSB0")]
    pub port: String,
    /// Defaults to the configured baud rate.
    #[schema(example = 9600)]
    pub baud_rate: Option<u32>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct ConnectResponse {
    #[schema(example = "connected")]
    pub status: String,
    #[schema(example = "/dev/ttyUSB0")]
    pub port: String,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct LinkStatus {
    pub connected: bool,
    pub port: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PositionRequest {
    #[schema(example = 118.0)]
    pub azimuth: f64,
    #[schema(example = 33.0)]
    pub elevation: f64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct PositionAck {
    pub azimuth: f64,
    pub elevation: f64,
    #[schema(example = "<AZ118><EL33>")]
    pub command: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// One pass of the pipeline for a catalog satellite, at the current time.
///
/// The command is only sent when a rotator is connected; otherwise the angle
/// is reported on its own.
fn locate(state: &AppState, name: &str) -> Result<PositionResponse, ApiError> {
    let elements = state.catalog.find(name).map_err(PipelineError::from)?;
    let at = state.clock.now();
    let timestamp = time_of_day(at);

    let angle = match state.pipeline.point(elements, at)? {
        Pointing::Visible(angle) => angle,
        Pointing::BelowHorizon { .. } => {
            return Ok(PositionResponse::BelowHorizon {
                error: "Satellite is below horizon".to_string(),
                timestamp,
            });
        }
    };

    let rotator = state
        .pipeline
        .is_link_open()
        .then(|| match state.pipeline.dispatch(&angle) {
            Ok(command) => RotatorOutcome::Sent {
                command: command.to_string(),
            },
            Err(error) => RotatorOutcome::Failed {
                error: error.to_string(),
            },
        });

    Ok(PositionResponse::Visible {
        azimuth: round2(angle.azimuth()),
        elevation: round2(angle.elevation()),
        timestamp,
        rotator,
    })
}

#[utoipa::path(get, path = "/", tag = "Ground Station API", responses())]
pub async fn root() -> impl IntoResponse {
    Json(json!({ "status": "ok", "message": "Ground Station API is running 🚀" }))
}

#[utoipa::path(
    get,
    path = "/satellites",
    tag = "Ground Station API",
    responses((status = 200, description = "Catalog satellite names", body = SatellitesResponse))
)]
pub async fn list_satellites(State(state): State<Arc<AppState>>) -> Json<SatellitesResponse> {
    Json(SatellitesResponse {
        satellites: state.catalog.names().map(str::to_string).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/get_satellite_data",
    tag = "Ground Station API",
    request_body = SatelliteRequest,
    responses(
        (status = 200, description = "Pointing angle, or below horizon", body = PositionResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 404, description = "Satellite not found", body = ErrorResponse),
        (status = 500, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn get_satellite_data(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SatelliteRequest>,
) -> Result<Json<PositionResponse>, ApiError> {
    // May write to the serial port.
    let response =
        tokio::task::spawn_blocking(move || locate(&state, &request.satellite_name)).await??;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/connect",
    tag = "Ground Station API",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Serial port opened", body = ConnectResponse),
        (status = 400, description = "Serial port could not be opened, or malformed body", body = ErrorResponse)
    )
)]
pub async fn connect(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let link = state
        .pipeline
        .link()
        .cloned()
        .ok_or(PipelineError::Detached)?;

    let mut settings = state.rotator.port_settings(&request.port);
    if let Some(baud_rate) = request.baud_rate {
        settings = settings.with_baud_rate(baud_rate);
    }

    // Opening blocks for the settle delay.
    tokio::task::spawn_blocking(move || link.open(&settings))
        .await?
        .map_err(PipelineError::from)?;

    Ok(Json(ConnectResponse {
        status: "connected".to_string(),
        port: request.port,
    }))
}

#[utoipa::path(
    post,
    path = "/disconnect",
    tag = "Ground Station API",
    responses((status = 200, description = "Serial port closed", body = LinkStatus))
)]
pub async fn disconnect(State(state): State<Arc<AppState>>) -> Result<Json<LinkStatus>, ApiError> {
    if let Some(link) = state.pipeline.link().cloned() {
        tokio::task::spawn_blocking(move || link.close()).await?;
    }

    Ok(Json(LinkStatus {
        connected: false,
        port: None,
    }))
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "Ground Station API",
    responses((status = 200, description = "Rotator link state", body = LinkStatus))
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<LinkStatus> {
    // Reads the link's port snapshot, which never waits on the serial port.
    let port = state.pipeline.link().and_then(|link| link.port());

    Json(LinkStatus {
        connected: port.is_some(),
        port,
    })
}

#[utoipa::path(
    post,
    path = "/set_position",
    tag = "Ground Station API",
    request_body = PositionRequest,
    responses(
        (status = 200, description = "Command sent", body = PositionAck),
        (status = 400, description = "Out of range, malformed body, or rotator not connected", body = ErrorResponse),
        (status = 500, description = "Serial write failed", body = ErrorResponse)
    )
)]
pub async fn set_position(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<PositionRequest>,
) -> Result<Json<PositionAck>, ApiError> {
    let position =
        ManualPosition::new(request.azimuth, request.elevation).map_err(PipelineError::from)?;

    let command =
        tokio::task::spawn_blocking(move || state.pipeline.set_position(position)).await??;

    Ok(Json(PositionAck {
        azimuth: request.azimuth,
        elevation: request.elevation,
        command: command.to_string(),
    }))
}
