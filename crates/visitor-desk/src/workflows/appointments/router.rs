use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{AppointmentId, ApprovalStatus, HostId, LocationId, NewAppointment};
use super::repository::{AppointmentFilter, AppointmentRepository, LocationDirectory};
use super::service::AppointmentWorkflow;
use crate::workflows::http::{respond, run_bounded, RouteSettings};

/// Router state: the workflow plus the request limits.
pub struct AppointmentApi<R, L> {
    workflow: Arc<AppointmentWorkflow<R, L>>,
    settings: RouteSettings,
}

impl<R, L> Clone for AppointmentApi<R, L> {
    fn clone(&self) -> Self {
        Self {
            workflow: Arc::clone(&self.workflow),
            settings: self.settings,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) host_id: Option<String>,
    pub(crate) status: Option<ApprovalStatus>,
    pub(crate) page: Option<usize>,
    pub(crate) page_size: Option<usize>,
    pub(crate) search: Option<String>,
    pub(crate) date: Option<NaiveDate>,
}

impl ListQuery {
    pub(crate) fn into_filter(self, default_page_size: usize) -> AppointmentFilter {
        AppointmentFilter {
            host_id: self.host_id.map(HostId),
            status: self.status,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(default_page_size),
            search: self.search,
            date: self.date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmApprovalBody {
    #[serde(default)]
    pub(crate) location_id: Option<LocationId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmDeclineBody {
    #[serde(default)]
    pub(crate) comment: String,
}

/// Router builder exposing listing, intake and the approval/decline commands.
pub fn appointment_router<R, L>(
    workflow: Arc<AppointmentWorkflow<R, L>>,
    settings: RouteSettings,
) -> Router
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/appointments",
            get(list_handler::<R, L>).post(create_handler::<R, L>),
        )
        .route(
            "/api/v1/appointments/:appointment_id",
            get(get_handler::<R, L>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/approval",
            post(request_approval_handler::<R, L>)
                .put(confirm_approval_handler::<R, L>)
                .delete(cancel_approval_handler::<R, L>),
        )
        .route(
            "/api/v1/appointments/:appointment_id/decline",
            post(request_decline_handler::<R, L>)
                .put(confirm_decline_handler::<R, L>)
                .delete(cancel_decline_handler::<R, L>),
        )
        .with_state(AppointmentApi { workflow, settings })
}

pub(crate) async fn list_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let filter = query.into_filter(api.settings.default_page_size);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.list_by_status(&filter)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn create_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    axum::Json(request): axum::Json<NewAppointment>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || workflow.create(request)).await;
    respond(result, StatusCode::CREATED)
}

pub(crate) async fn get_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || workflow.get(&id)).await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn request_approval_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.request_approval(&id)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn confirm_approval_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
    axum::Json(body): axum::Json<ConfirmApprovalBody>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.confirm_approval(&id, body.location_id)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn cancel_approval_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.cancel_approval(&id)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn request_decline_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.request_decline(&id)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn confirm_decline_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
    axum::Json(body): axum::Json<ConfirmDeclineBody>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.confirm_decline(&id, &body.comment)
    })
    .await;
    respond(result, StatusCode::OK)
}

pub(crate) async fn cancel_decline_handler<R, L>(
    State(api): State<AppointmentApi<R, L>>,
    Path(appointment_id): Path<String>,
) -> Response
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    let id = AppointmentId(appointment_id);
    let workflow = api.workflow;
    let result = run_bounded(api.settings.store_timeout, move || {
        workflow.cancel_decline(&id)
    })
    .await;
    respond(result, StatusCode::OK)
}
