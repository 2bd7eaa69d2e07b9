use actix_web::HttpResponse;
use serde_json::json;
use sqlx::MySqlPool;

use crate::config::Config;
use crate::core::error::AttendanceError;
use crate::core::forgot_timeout::ForgotTimeoutWorkflow;
use crate::core::recorder::AttendanceRecorder;
use crate::repo::mysql::{
    MySqlAttendanceRepo, MySqlComplianceRepo, MySqlForgotTimeoutRepo, MySqlProfileRepo,
};

pub mod attendance;
pub mod forgot_timeout;

pub type MySqlRecorder =
    AttendanceRecorder<MySqlAttendanceRepo, MySqlProfileRepo, MySqlComplianceRepo>;
pub type MySqlWorkflow =
    ForgotTimeoutWorkflow<MySqlForgotTimeoutRepo, MySqlAttendanceRepo, MySqlProfileRepo>;

/// Engine components are assembled per request over the shared pool.
pub(crate) fn recorder(pool: &MySqlPool, config: &Config) -> MySqlRecorder {
    AttendanceRecorder::new(
        MySqlAttendanceRepo::new(pool.clone()),
        MySqlProfileRepo::new(pool.clone()),
        MySqlComplianceRepo::new(pool.clone()),
        config.required_document_count,
        config.block_schedule(),
        config.geofence(),
        config.pacing(),
    )
}

pub(crate) fn workflow(pool: &MySqlPool, config: &Config) -> MySqlWorkflow {
    ForgotTimeoutWorkflow::new(
        MySqlForgotTimeoutRepo::new(pool.clone()),
        MySqlAttendanceRepo::new(pool.clone()),
        MySqlProfileRepo::new(pool.clone()),
        config.block_schedule(),
        config.pacing(),
    )
}

/// Every expected failure becomes a structured 4xx body with a stable reason
/// code; only infrastructure failures surface as a generic 500.
pub(crate) fn error_response(err: AttendanceError) -> HttpResponse {
    match &err {
        AttendanceError::System(e) => {
            tracing::error!(error = %e, "attendance operation failed");
            HttpResponse::InternalServerError().json(json!({
                "success": false,
                "reason": "system_error",
                "message": "Internal Server Error"
            }))
        }
        AttendanceError::ComplianceRequired { .. } => HttpResponse::Forbidden().json(json!({
            "success": false,
            "reason": err.reason(),
            "message": err.to_string(),
            "redirect": "/documents"
        })),
        _ => HttpResponse::BadRequest().json(json!({
            "success": false,
            "reason": err.reason(),
            "message": err.to_string()
        })),
    }
}
