use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// At most one per attendance record, enforced by a unique key. Status is
/// terminal once it leaves `pending`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ForgotTimeoutRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub attendance_record_id: u64,
    #[schema(example = 1000)]
    pub student_id: u64,
    #[schema(example = "Phone battery died before I could time out")]
    pub reason: String,
    pub letter_file_path: Option<String>,
    pub status: RequestStatus,
    pub instructor_response: Option<String>,
    #[schema(example = "2026-01-06T09:12:00", value_type = Option<String>)]
    pub reviewed_at: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T18:40:00", value_type = Option<String>)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewForgotTimeoutRequest {
    pub attendance_record_id: u64,
    pub student_id: u64,
    pub reason: String,
    pub letter_file_path: Option<String>,
}
