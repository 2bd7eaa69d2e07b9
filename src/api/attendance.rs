use crate::auth::auth::SessionUser;
use crate::config::Config;
use crate::core::geofence::Coordinate;
use crate::model::attendance::BlockType;
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use super::{error_response, recorder};

#[derive(Deserialize, ToSchema)]
pub struct TimeInRequest {
    #[schema(example = "morning")]
    pub block: BlockType,
    #[schema(example = 10.3159)]
    pub latitude: f64,
    #[schema(example = 123.8854)]
    pub longitude: f64,
    /// Reference to an already-uploaded clock-in photo; storage is handled
    /// by the file collaborator.
    #[schema(example = "photos/2026-01-05_1000.jpg")]
    pub photo_path: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct TimeOutRequest {
    #[schema(example = "morning")]
    pub block: BlockType,
    #[schema(example = 10.3159)]
    pub latitude: f64,
    #[schema(example = 123.8854)]
    pub longitude: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LocationQuery {
    #[schema(example = 10.3159)]
    pub latitude: f64,
    #[schema(example = 123.8854)]
    pub longitude: f64,
}

/// Time-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/time-in",
    request_body = TimeInRequest,
    responses(
        (status = 200, description = "Timed in successfully", body = Object, example = json!({
            "success": true,
            "message": "Timed in for the morning block",
            "record": {"id": 42, "block_type": "morning", "time_in": "2026-01-05T08:01:30"}
        })),
        (status = 400, description = "Duplicate time-in, ineligible block, or location failure", body = Object, example = json!({
            "success": false,
            "reason": "duplicate_time_in",
            "message": "You already timed in for the morning block today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Document compliance not met"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn time_in(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<TimeInRequest>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;
    let payload = payload.into_inner();

    let coordinate = match Coordinate::new(payload.latitude, payload.longitude) {
        Ok(c) => c,
        Err(e) => return Ok(error_response(e)),
    };

    let now = Local::now().naive_local();
    let result = recorder(&pool, &config)
        .time_in(student_id, payload.block, Some(coordinate), payload.photo_path, now)
        .await;

    match result {
        Ok(record) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Timed in for the {} block", record.block_type),
            "record": record
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Time-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/time-out",
    request_body = TimeOutRequest,
    responses(
        (status = 200, description = "Timed out successfully", body = Object, example = json!({
            "success": true,
            "message": "Timed out of the morning block",
            "hours_earned": 3.0,
            "total_hours": 185.5,
            "status": "on_track"
        })),
        (status = 400, description = "No open record, already closed, or location failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Document compliance not met"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn time_out(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<TimeOutRequest>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;
    let payload = payload.into_inner();

    let coordinate = match Coordinate::new(payload.latitude, payload.longitude) {
        Ok(c) => c,
        Err(e) => return Ok(error_response(e)),
    };

    let now = Local::now().naive_local();
    let result = recorder(&pool, &config)
        .time_out(student_id, payload.block, Some(coordinate), now)
        .await;

    match result {
        Ok(outcome) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Timed out of the {} block", payload.block),
            "hours_earned": outcome.hours_earned,
            "total_hours": outcome.total_hours,
            "status": outcome.status
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Location pre-check for the clock page
#[utoipa::path(
    get,
    path = "/api/v1/attendance/check-location",
    params(LocationQuery),
    responses(
        (status = 200, description = "Distance and validity against the registered workplace", body = Object, example = json!({
            "success": true,
            "valid": true,
            "distance_m": 24.7,
            "workplace": {"lat": 10.3157, "lon": 123.8854},
            "workplace_name": "Acme Software Services"
        })),
        (status = 400, description = "Invalid coordinate or no registered workplace"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Document compliance not met")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_location(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<LocationQuery>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;

    let coordinate = match Coordinate::new(query.latitude, query.longitude) {
        Ok(c) => c,
        Err(e) => return Ok(error_response(e)),
    };

    match recorder(&pool, &config).check_location(student_id, coordinate).await {
        Ok(check) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "valid": check.valid,
            "distance_m": check.distance_m,
            "workplace": check.workplace,
            "workplace_name": check.workplace_name
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Today's per-block status
#[utoipa::path(
    get,
    path = "/api/v1/attendance/blocks",
    responses(
        (status = 200, description = "Status of each block for today", body = Object, example = json!({
            "success": true,
            "blocks": [
                {"block": "morning", "start": "07:00:00", "end": "12:00:00", "status": "time_in", "can_time_in": false, "can_time_out": true},
                {"block": "afternoon", "start": "13:00:00", "end": "17:00:00", "status": "not_started", "can_time_in": false, "can_time_out": false},
                {"block": "overtime", "start": "17:30:00", "end": "20:30:00", "status": "not_started", "can_time_in": false, "can_time_out": false}
            ]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Document compliance not met")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn blocks(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;

    let now = Local::now().naive_local();
    match recorder(&pool, &config).day_overview(student_id, now).await {
        Ok(blocks) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "blocks": blocks
        }))),
        Err(e) => Ok(error_response(e)),
    }
}

/// Accumulated hours and pacing status
#[utoipa::path(
    get,
    path = "/api/v1/attendance/progress",
    responses(
        (status = 200, description = "Accumulated hours toward the requirement", body = Object, example = json!({
            "success": true,
            "total_hours": 185.5,
            "required_hours": 600.0,
            "status": "on_track"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Document compliance not met")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn progress(
    session: SessionUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let student_id = session.require_student()?;

    let now = Local::now().naive_local();
    match recorder(&pool, &config).progress(student_id, now).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total_hours": summary.total_hours,
            "required_hours": summary.required_hours,
            "status": summary.status
        }))),
        Err(e) => Ok(error_response(e)),
    }
}
