use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::domain::{AccessLogEntry, AccessStatus, OverstayResolution, Token, VisitorId};
use super::repository::{AccessLogRepository, VisitRepository};
use super::service::VisitLifecycle;
use crate::workflows::appointments::{AppointmentId, AppointmentRepository};
use crate::workflows::http::{respond, run_bounded, RouteSettings};

/// Router state: the lifecycle engine plus the request limits.
pub struct VisitApi<V, A, R> {
    lifecycle: Arc<VisitLifecycle<V, A, R>>,
    settings: RouteSettings,
}

impl<V, A, R> Clone for VisitApi<V, A, R> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: Arc::clone(&self.lifecycle),
            settings: self.settings,
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueTokenBody {
    pub(crate) appointment_id: AppointmentId,
    pub(crate) visitor_id: VisitorId,
    pub(crate) token: Token,
}

/// Optional explicit timestamp; the server clock is used when absent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AtBody {
    #[serde(default)]
    pub(crate) at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExtendBody {
    pub(crate) minutes: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveBody {
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
    pub(crate) resolution: OverstayResolution,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NowQuery {
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScanBody {
    pub(crate) token: Token,
    pub(crate) location: String,
    pub(crate) status: AccessStatus,
    #[serde(default)]
    pub(crate) timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtendResponse {
    pub(crate) token: Token,
    pub(crate) scheduled_end: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct LocationResponse {
    pub(crate) token: Token,
    pub(crate) location: String,
}

/// Router builder for token issuance, check-in/out, overstay handling and scans.
pub fn visit_router<V, A, R>(
    lifecycle: Arc<VisitLifecycle<V, A, R>>,
    settings: RouteSettings,
) -> Router
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/visits", post(issue_handler::<V, A, R>))
        .route("/api/v1/visits/board", get(board_handler::<V, A, R>))
        .route("/api/v1/visits/overstays", get(overstays_handler::<V, A, R>))
        .route("/api/v1/visits/:token", get(visit_handler::<V, A, R>))
        .route(
            "/api/v1/visits/:token/check-in",
            post(check_in_handler::<V, A, R>),
        )
        .route(
            "/api/v1/visits/:token/check-out",
            post(check_out_handler::<V, A, R>),
        )
        .route("/api/v1/visits/:token/end", post(end_handler::<V, A, R>))
        .route(
            "/api/v1/visits/:token/extend",
            post(extend_handler::<V, A, R>),
        )
        .route(
            "/api/v1/visits/:token/overstay",
            post(resolve_handler::<V, A, R>),
        )
        .route(
            "/api/v1/visits/:token/location",
            get(location_handler::<V, A, R>),
        )
        .route("/api/v1/access-log", post(scan_handler::<V, A, R>))
        .with_state(VisitApi {
            lifecycle,
            settings,
        })
}

pub(crate) async fn issue_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    axum::Json(body): axum::Json<IssueTokenBody>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.issue_token(&body.appointment_id, body.visitor_id, body.token)
    })
    .await;
    respond(result, StatusCode::CREATED)
}

pub(crate) async fn visit_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || lifecycle.visit(&token)).await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn check_in_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
    body: Option<axum::Json<AtBody>>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let at = body.and_then(|axum::Json(body)| body.at).unwrap_or_else(local_now);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.check_in(&token, at)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn check_out_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
    body: Option<axum::Json<AtBody>>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let at = body.and_then(|axum::Json(body)| body.at).unwrap_or_else(local_now);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.check_out(&token, at)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn end_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.end_meeting(&token)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn extend_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
    axum::Json(body): axum::Json<ExtendBody>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle
            .extend_stay(&token, body.minutes)
            .map(|scheduled_end| ExtendResponse {
                token,
                scheduled_end,
            })
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn resolve_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
    axum::Json(body): axum::Json<ResolveBody>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let now = body.now.unwrap_or_else(local_now);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.resolve_overstay(&token, now, body.resolution)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn location_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Path(token): Path<String>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let token = Token(token);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle
            .current_location(&token)
            .map(|location| LocationResponse { token, location })
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn board_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Query(query): Query<NowQuery>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let now = query.now.unwrap_or_else(local_now);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || lifecycle.visit_board(now)).await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn overstays_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    Query(query): Query<NowQuery>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let now = query.now.unwrap_or_else(local_now);
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || lifecycle.overstays(now)).await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn scan_handler<V, A, R>(
    State(api): State<VisitApi<V, A, R>>,
    axum::Json(body): axum::Json<ScanBody>,
) -> Response
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    let entry = AccessLogEntry {
        token: body.token,
        location: body.location,
        status: body.status,
        timestamp: body.timestamp.unwrap_or_else(local_now),
    };
    let lifecycle = api.lifecycle;
    let result = run_bounded(api.settings.store_timeout, move || {
        lifecycle.record_scan(entry)
    })
    .await;
    respond(result, StatusCode::CREATED)
}
