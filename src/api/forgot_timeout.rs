use crate::auth::auth::SessionUser;
use crate::config::Config;
use crate::core::forgot_timeout::{HoursDecision, ResolveDecision};
use crate::model::forgot_timeout::{ForgotTimeoutRequest, RequestStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use super::{error_response, workflow};

#[derive(Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[schema(example = 42)]
    pub attendance_record_id: u64,
    #[schema(example = "Phone battery died before I could time out")]
    pub reason: String,
    /// Original file name of the uploaded excuse letter, if any.
    #[schema(example = "excuse.pdf")]
    pub letter_file: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveRequest {
    #[schema(example = "approved")]
    pub decision: ResolveDecision,
    /// Only meaningful on approval; defaults to keeping the computed hours.
    pub hours_decision: Option<HoursDecision>,
    #[schema(example = "Letter verified with the workplace supervisor")]
    pub response: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<RequestStatus>,
    #[schema(example = 1000)]
    /// Filter by student ID
    pub student_id: Option<u64>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<ForgotTimeoutRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Submit a forgot-timeout request
#[utoipa::path(
    post,
    path = "/api/v1/forgot-timeout",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "success": true,
            "message": "Forgot-timeout request submitted",
            "request": {"id": 1, "attendance_record_id": 42, "status": "pending"}
        })),
        (status = 400, description = "Record mismatch or a request already exists", body = Object, example = json!({
            "success": false,
            "reason": "request_already_exists",
            "message": "A forgot-timeout request already exists for this record"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "ForgotTimeout"
)]
pub async fn submit(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<SubmitRequest>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;
    let payload = payload.into_inner();

    let result = workflow(&pool, &config)
        .submit(student_id, payload.attendance_record_id, payload.reason, payload.letter_file)
        .await;

    match result {
        Ok(request) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Forgot-timeout request submitted",
            "request": request
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Resolve a forgot-timeout request (Instructor/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/forgot-timeout/{request_id}/resolve",
    params(
        ("request_id" = u64, Path, description = "ID of the request to resolve")
    ),
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Request resolved", body = Object, example = json!({
            "success": true,
            "message": "Request approved",
            "hours_earned": 4.0,
            "total_hours": 185.5
        })),
        (status = 400, description = "Request not found or already resolved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "ForgotTimeout"
)]
pub async fn resolve(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<ResolveRequest>,
) -> actix_web::Result<impl Responder> {
    session.require_instructor_or_admin()?;

    let request_id = path.into_inner();
    let payload = payload.into_inner();

    let now = Local::now().naive_local();
    let result = workflow(&pool, &config)
        .resolve(
            request_id,
            session.user_id,
            payload.decision,
            payload.hours_decision,
            payload.response,
            now,
        )
        .await;

    match result {
        Ok(outcome) => {
            let message = match outcome.status {
                RequestStatus::Approved => "Request approved",
                RequestStatus::Rejected => "Request rejected",
                RequestStatus::Pending => "Request pending",
            };
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": message,
                "status": outcome.status,
                "hours_earned": outcome.hours_earned,
                "total_hours": outcome.total_hours
            })))
        }
        Err(e) => Ok(error_response(e)),
    }
}

/// List forgot-timeout requests (Instructor/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/forgot-timeout",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "ForgotTimeout"
)]
pub async fn list(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    session.require_instructor_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let result = workflow(&pool, &config)
        .list(query.status, query.student_id, per_page, offset)
        .await;

    match result {
        Ok(page_data) => Ok(HttpResponse::Ok().json(RequestListResponse {
            data: page_data.data,
            page: page as u32,
            per_page: per_page as u32,
            total: page_data.total,
        })),
        Err(e) => Ok(error_response(e)),
    }
}
