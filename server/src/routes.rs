//! JSON endpoints over the loaded tracks, plus the static frontend.

use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Path, Query, Request, State},
    http::StatusCode,
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use track_viewer_data_management::{
    queries::{TrackFilter, DEFAULT_HEATMAP_PRECISION},
    report::{Report, ReportPeriod},
};
use track_viewer_lib::{error::TrackError, track::Track};

use crate::{
    config::TileLayer,
    format::{activity_emoji, format_duration, month_name},
    server_state::ServerState,
};

pub fn router(state: Arc<ServerState>) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/tracks", get(get_tracks))
        .route("/track/{track_id}", get(get_track))
        .route("/activities", get(get_activities))
        .route("/activity/{activity}", get(get_activity_tracks))
        .route("/reports", get(get_reports))
        .route("/report/{year}", get(get_year_report))
        .route("/report/{year}/{month}", get(get_month_report))
        .route("/report/{year}/{month}/{day}", get(get_day_report))
        .route("/points", get(get_points))
        .route("/heatmap", get(get_heatmap))
        .route("/tile_layers", get(get_tile_layers))
        .fallback_service(static_dir)
        .with_state(state)
        .layer(from_fn(log_request))
}

async fn log_request(request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::debug!("{} {} from {}", request.method(), request.uri().path(), client);

    next.run(request).await
}

/// Maps data errors onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(pub TrackError);

impl From<TrackError> for ApiError {
    fn from(err: TrackError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TrackError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            TrackError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        (status, self.0.to_string()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub activity: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl FilterParams {
    fn filter(self) -> Result<TrackFilter, TrackError> {
        TrackFilter::new(self.activity, self.year, self.month, self.day)
    }
}

// Kept flat rather than flattening FilterParams, as flattened query fields lose their numeric parsing.
#[derive(Debug, Default, Deserialize)]
pub struct HeatmapParams {
    pub activity: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub precision: Option<u32>,
}

/// A track without its points.
#[derive(Debug, Serialize)]
pub struct TrackOverview<'a> {
    pub id: &'a str,
    pub activity: Option<&'a str>,
    pub emoji: Option<String>,
    pub color: Option<&'a str>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub length_2d: f64,
    pub length_3d: f64,
    pub uphill: f64,
    pub downhill: f64,
    pub moving_time: f64,
    pub moving_time_text: String,
    pub stopped_time: f64,
    pub max_speed: f64,
}

impl<'a> TrackOverview<'a> {
    fn new(track: &'a Track, state: &'a ServerState) -> Self {
        let activity = track.activity.as_deref();

        Self {
            id: &track.name,
            activity,
            emoji: activity.map(|activity| activity_emoji(activity, false)),
            color: state.color_of(activity),
            start_time: track.start_time,
            end_time: track.end_time,
            length_2d: track.length_2d,
            length_3d: track.length_3d,
            uphill: track.uphill,
            downhill: track.downhill,
            moving_time: track.moving_time,
            moving_time_text: format_duration(track.moving_time),
            stopped_time: track.stopped_time,
            max_speed: track.max_speed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrackDetail<'a> {
    #[serde(flatten)]
    pub track: &'a Track,
    pub color: Option<&'a str>,
    /// `[latitude, longitude]` per point
    pub polyline_points: Vec<[f64; 2]>,
    /// `[distance_2d, elevation]` per point, `elevation` being null when unknown
    pub elevation_list: Vec<(f64, Option<f64>)>,
}

impl<'a> TrackDetail<'a> {
    fn new(track: &'a Track, state: &'a ServerState) -> Self {
        let polyline_points = track.points.iter().map(|point| [point.latitude, point.longitude]).collect();
        let elevation_list = track.points.iter().map(|point| (point.distance_2d, point.elevation)).collect();

        Self {
            track,
            color: state.color_of(track.activity.as_deref()),
            polyline_points,
            elevation_list,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityView<'a> {
    pub name: String,
    pub emoji: String,
    pub color: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub year: i32,
    pub month: Option<u32>,
    pub month_name: Option<&'static str>,
    pub day: Option<u32>,
    pub activities: Vec<ActivityView<'a>>,
    pub tracks: Vec<TrackOverview<'a>>,
    pub periods: Vec<ReportPeriod>,
}

impl<'a> ReportView<'a> {
    fn new(report: Report<'a>, state: &'a ServerState) -> Self {
        Self {
            year: report.year,
            month: report.month,
            month_name: report.month.and_then(month_name),
            day: report.day,
            activities: report
                .activities
                .into_iter()
                .map(|name| activity_view(name, state))
                .collect(),
            tracks: report
                .tracks
                .into_iter()
                .map(|track| TrackOverview::new(track, state))
                .collect(),
            periods: report.periods,
        }
    }
}

fn activity_view(name: String, state: &ServerState) -> ActivityView<'_> {
    ActivityView {
        emoji: activity_emoji(&name, true),
        color: state.color_of(Some(&name)),
        name,
    }
}

#[derive(Debug, Serialize)]
pub struct TileLayers<'a> {
    pub default: &'a str,
    pub layers: &'a BTreeMap<String, TileLayer>,
}

async fn get_tracks(State(state): State<Arc<ServerState>>) -> Response {
    let tracks = state
        .data_manager
        .collection()
        .tracks()
        .map(|track| TrackOverview::new(track, &state))
        .collect::<Vec<_>>();

    Json(tracks).into_response()
}

async fn get_track(
    State(state): State<Arc<ServerState>>,
    Path(track_id): Path<String>,
) -> Result<Response, ApiError> {
    let track = state.data_manager.get_track(&track_id)?;
    Ok(Json(TrackDetail::new(track, &state)).into_response())
}

async fn get_activities(State(state): State<Arc<ServerState>>) -> Response {
    let activities = state
        .data_manager
        .activities()
        .into_iter()
        .map(|name| activity_view(name, &state))
        .collect::<Vec<_>>();

    Json(activities).into_response()
}

async fn get_activity_tracks(
    State(state): State<Arc<ServerState>>,
    Path(activity): Path<String>,
) -> Result<Response, ApiError> {
    let tracks = state.data_manager.filter_tracks(&TrackFilter::activity(&activity));
    if tracks.is_empty() {
        return Err(TrackError::NotFound(format!("No tracks for activity {activity}")).into());
    }

    let tracks = tracks
        .into_iter()
        .map(|track| TrackOverview::new(track, &state))
        .collect::<Vec<_>>();

    Ok(Json(tracks).into_response())
}

async fn get_reports(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.data_manager.monthly_buckets()).into_response()
}

async fn get_year_report(
    State(state): State<Arc<ServerState>>,
    Path(year): Path<i32>,
) -> Result<Response, ApiError> {
    let report = state.data_manager.year_report(year, state.timezone)?;
    Ok(Json(ReportView::new(report, &state)).into_response())
}

async fn get_month_report(
    State(state): State<Arc<ServerState>>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Response, ApiError> {
    let report = state.data_manager.month_report(year, month, state.timezone)?;
    Ok(Json(ReportView::new(report, &state)).into_response())
}

async fn get_day_report(
    State(state): State<Arc<ServerState>>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Response, ApiError> {
    let report = state.data_manager.day_report(year, month, day, state.timezone)?;
    Ok(Json(ReportView::new(report, &state)).into_response())
}

async fn get_points(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<FilterParams>,
) -> Result<Response, ApiError> {
    let points = state
        .data_manager
        .all_points(&params.filter()?)
        .into_iter()
        .map(|(latitude, longitude)| [latitude, longitude])
        .collect::<Vec<_>>();

    Ok(Json(points).into_response())
}

async fn get_heatmap(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HeatmapParams>,
) -> Result<Response, ApiError> {
    let filter = TrackFilter::new(params.activity, params.year, params.month, params.day)?;
    let precision = params.precision.unwrap_or(DEFAULT_HEATMAP_PRECISION);

    let grid = state.data_manager.heatmap_grid(&filter, precision)?;
    Ok(Json(grid).into_response())
}

async fn get_tile_layers(State(state): State<Arc<ServerState>>) -> Response {
    Json(TileLayers {
        default: &state.config.default_tile_layer,
        layers: &state.config.tile_layers,
    })
    .into_response()
}
