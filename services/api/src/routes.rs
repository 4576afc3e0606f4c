use crate::infra::{format_timestamp, AppState, Desk, DeskWorkflow};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use visitor_desk::error::AppError;
use visitor_desk::export::{CsvExporter, DocumentRenderer, ExportRow};
use visitor_desk::workflows::appointments::{
    appointment_router, Appointment, AppointmentFilter, ApprovalStatus,
};
use visitor_desk::workflows::visits::{visit_router, VisitBoardRow};
use visitor_desk::workflows::{run_bounded, WorkflowError};

const EXPORT_PAGE_SIZE: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AppointmentExportQuery {
    #[serde(default)]
    pub(crate) status: Option<ApprovalStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VisitExportQuery {
    #[serde(default)]
    pub(crate) now: Option<NaiveDateTime>,
}

pub(crate) fn with_desk_routes(desk: Desk) -> Router {
    appointment_router(desk.appointments.clone(), desk.settings)
        .merge(visit_router(desk.visits.clone(), desk.settings))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/appointments/export", get(appointment_export_endpoint))
        .route("/api/v1/visits/export", get(visit_export_endpoint))
        .layer(Extension(desk))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn appointment_export_endpoint(
    Extension(desk): Extension<Desk>,
    Query(query): Query<AppointmentExportQuery>,
) -> Result<Response, AppError> {
    let workflow = desk.appointments;
    let records = run_bounded(desk.settings.store_timeout, move || {
        all_appointments(&workflow, query.status)
    })
    .await?;

    csv_response(&appointment_rows(&records), "appointments.csv")
}

pub(crate) async fn visit_export_endpoint(
    Extension(desk): Extension<Desk>,
    Query(query): Query<VisitExportQuery>,
) -> Result<Response, AppError> {
    let now = query.now.unwrap_or_else(|| Local::now().naive_local());
    let lifecycle = desk.visits;
    let board = run_bounded(desk.settings.store_timeout, move || lifecycle.visit_board(now)).await?;

    csv_response(&visit_rows(&board), "visits.csv")
}

/// Walks every page of the filtered listing.
pub(crate) fn all_appointments(
    workflow: &DeskWorkflow,
    status: Option<ApprovalStatus>,
) -> Result<Vec<Appointment>, WorkflowError> {
    let mut collected = Vec::new();
    let mut page = 1;
    loop {
        let filter = AppointmentFilter {
            status,
            page,
            page_size: EXPORT_PAGE_SIZE,
            ..AppointmentFilter::default()
        };
        let listing = workflow.list_by_status(&filter)?;
        let fetched = listing.rows.len();
        collected.extend(listing.rows);
        if fetched == 0 || collected.len() >= listing.total {
            return Ok(collected);
        }
        page += 1;
    }
}

pub(crate) fn appointment_rows(records: &[Appointment]) -> Vec<ExportRow> {
    records
        .iter()
        .map(|record| {
            ExportRow::new()
                .cell("Appointment", record.id.to_string())
                .cell("Visitor", record.requester.name.as_str())
                .cell("Email", record.requester.email.as_str())
                .cell("Company", record.requester.company.clone().unwrap_or_default())
                .cell("Host", record.host_id.0.as_str())
                .cell("Purpose", record.purpose.as_str())
                .cell("Starts", format_timestamp(Some(record.starts_at())))
                .cell("Ends", format_timestamp(record.scheduled_end()))
                .cell("Status", record.approval_status.label())
                .cell(
                    "Location",
                    record
                        .location_id
                        .as_ref()
                        .map(|location| location.0.clone())
                        .unwrap_or_default(),
                )
                .cell("Comment", record.decline_comment.clone().unwrap_or_default())
        })
        .collect()
}

pub(crate) fn visit_rows(board: &[VisitBoardRow]) -> Vec<ExportRow> {
    board
        .iter()
        .map(|row| {
            ExportRow::new()
                .cell("Visit", row.visit_id.0.as_str())
                .cell("Token", row.token.to_string())
                .cell("Visitor", row.visitor_id.0.as_str())
                .cell("Appointment", row.appointment_id.to_string())
                .cell("Status", row.status_label)
                .cell("Checked In", format_timestamp(row.checkin_time))
                .cell("Checked Out", format_timestamp(row.checkout_time))
                .cell("Scheduled End", format_timestamp(row.scheduled_end))
                .cell("Location", row.current_location.as_str())
                .cell("Overstayed", if row.overstayed { "Yes" } else { "No" })
        })
        .collect()
}

fn csv_response(rows: &[ExportRow], filename: &str) -> Result<Response, AppError> {
    let exporter = CsvExporter;
    let document = exporter.render_to_vec(rows)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, exporter.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        document,
    )
        .into_response())
}
