use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;

use crate::model::attendance::{AttendanceRecord, BlockType, NewAttendanceRecord};
use crate::model::forgot_timeout::{ForgotTimeoutRequest, NewForgotTimeoutRequest, RequestStatus};
use crate::model::profile::{ProgressStatus, StudentProfile};

pub mod mysql;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Display)]
pub enum RepoError {
    /// Unique-key violation; the engine maps this to the domain-level
    /// duplicate error for the operation in flight.
    #[display(fmt = "duplicate key")]
    Duplicate,
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        // MySQL integrity-constraint violations (duplicate key) report SQLSTATE 23000
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return RepoError::Duplicate;
            }
        }
        RepoError::Database(e)
    }
}

/// Attendance records. `insert_open` must be atomic with respect to the
/// one-record-per-(student, date, block) constraint: concurrent inserts for
/// the same key yield exactly one row and one `Duplicate` error.
pub trait AttendanceRepository {
    async fn find_for_block(
        &self,
        student_id: u64,
        date: NaiveDate,
        block: BlockType,
    ) -> Result<Option<AttendanceRecord>, RepoError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, RepoError>;

    async fn records_for_day(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, RepoError>;

    /// Returns the new record id, or `Duplicate` when a row already exists
    /// for (student, date, block).
    async fn insert_open(&self, new: &NewAttendanceRecord) -> Result<u64, RepoError>;

    /// Conditional close: only touches the row while `time_out IS NULL`.
    /// Returns false when the record was already closed (or missing).
    async fn close_if_open(
        &self,
        record_id: u64,
        time_out: NaiveDateTime,
        hours_earned: f64,
    ) -> Result<bool, RepoError>;

    async fn sum_closed_hours(&self, student_id: u64) -> Result<f64, RepoError>;
}

pub trait ProfileRepository {
    async fn find(&self, user_id: u64) -> Result<Option<StudentProfile>, RepoError>;

    async fn update_progress(
        &self,
        user_id: u64,
        total_hours: f64,
        status: ProgressStatus,
    ) -> Result<(), RepoError>;
}

/// Read-only view over the document collaborator's tables; the snapshot is
/// recomputed on every gate check, never cached here.
pub trait ComplianceRepository {
    async fn approved_required_count(&self, student_id: u64) -> Result<u32, RepoError>;
}

#[derive(Debug, Clone)]
pub struct RequestPage {
    pub data: Vec<ForgotTimeoutRequest>,
    pub total: i64,
}

pub trait ForgotTimeoutRepository {
    /// Returns the new request id, or `Duplicate` when the record already
    /// has a request (unique key on attendance_record_id).
    async fn insert_pending(&self, new: &NewForgotTimeoutRequest) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<ForgotTimeoutRequest>, RepoError>;

    async fn find_by_record(
        &self,
        attendance_record_id: u64,
    ) -> Result<Option<ForgotTimeoutRequest>, RepoError>;

    /// Conditional resolve: only moves `pending` rows into a terminal status.
    /// Returns false when the request was already resolved.
    async fn resolve_if_pending(
        &self,
        id: u64,
        status: RequestStatus,
        instructor_response: Option<&str>,
        reviewed_at: NaiveDateTime,
    ) -> Result<bool, RepoError>;

    async fn list(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<u64>,
        limit: u64,
        offset: u64,
    ) -> Result<RequestPage, RepoError>;
}
