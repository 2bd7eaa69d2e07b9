use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRecord, BlockType, NewAttendanceRecord};
use crate::model::forgot_timeout::{ForgotTimeoutRequest, NewForgotTimeoutRequest, RequestStatus};
use crate::model::profile::{ProgressStatus, StudentProfile};

use super::{
    AttendanceRepository, ComplianceRepository, ForgotTimeoutRepository, ProfileRepository,
    RepoError, RequestPage,
};

// Helper enum for typed SQLx binding in dynamically built filters
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Clone)]
pub struct MySqlAttendanceRepo {
    pool: MySqlPool,
}

impl MySqlAttendanceRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const RECORD_COLUMNS: &str = "id, student_id, date, block_type, time_in, time_out, \
     hours_earned, lat_in, lon_in, photo_path";

impl AttendanceRepository for MySqlAttendanceRepo {
    async fn find_for_block(
        &self,
        student_id: u64,
        date: NaiveDate,
        block: BlockType,
    ) -> Result<Option<AttendanceRecord>, RepoError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE student_id = ? AND date = ? AND block_type = ?"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(student_id)
            .bind(date)
            .bind(block)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, RepoError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = ?");
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn records_for_day(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, RepoError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records \
             WHERE student_id = ? AND date = ? ORDER BY time_in"
        );
        sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(student_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn insert_open(&self, new: &NewAttendanceRecord) -> Result<u64, RepoError> {
        // The unique key on (student_id, date, block_type) is what makes
        // check-then-insert safe under concurrent requests.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records
                (student_id, date, block_type, time_in, lat_in, lon_in, photo_path)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.student_id)
        .bind(new.date)
        .bind(new.block_type)
        .bind(new.time_in)
        .bind(new.lat_in)
        .bind(new.lon_in)
        .bind(new.photo_path.as_deref())
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.last_insert_id())
    }

    async fn close_if_open(
        &self,
        record_id: u64,
        time_out: NaiveDateTime,
        hours_earned: f64,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_records
            SET time_out = ?, hours_earned = ?
            WHERE id = ? AND time_out IS NULL
            "#,
        )
        .bind(time_out)
        .bind(hours_earned)
        .bind(record_id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn sum_closed_hours(&self, student_id: u64) -> Result<f64, RepoError> {
        let total: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT SUM(hours_earned) FROM attendance_records
            WHERE student_id = ? AND time_out IS NOT NULL
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(total.unwrap_or(0.0))
    }
}

#[derive(Clone)]
pub struct MySqlProfileRepo {
    pool: MySqlPool,
}

impl MySqlProfileRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl ProfileRepository for MySqlProfileRepo {
    async fn find(&self, user_id: u64) -> Result<Option<StudentProfile>, RepoError> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            SELECT user_id, workplace_name, workplace_lat, workplace_lon,
                   total_hours_accumulated, status, workplace_location_locked,
                   training_start_date, expected_end_date
            FROM student_profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)
    }

    async fn update_progress(
        &self,
        user_id: u64,
        total_hours: f64,
        status: ProgressStatus,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE student_profiles
            SET total_hours_accumulated = ?, status = ?
            WHERE user_id = ?
            "#,
        )
        .bind(total_hours)
        .bind(status)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct MySqlComplianceRepo {
    pool: MySqlPool,
}

impl MySqlComplianceRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl ComplianceRepository for MySqlComplianceRepo {
    async fn approved_required_count(&self, student_id: u64) -> Result<u32, RepoError> {
        // student_documents is owned by the document-review collaborator;
        // this service only ever counts approved required types.
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT document_type) FROM student_documents
            WHERE student_id = ? AND is_required = 1 AND status = 'approved'
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(count.max(0) as u32)
    }
}

#[derive(Clone)]
pub struct MySqlForgotTimeoutRepo {
    pool: MySqlPool,
}

impl MySqlForgotTimeoutRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = "id, attendance_record_id, student_id, reason, \
     letter_file_path, status, instructor_response, reviewed_at, created_at";

impl ForgotTimeoutRepository for MySqlForgotTimeoutRepo {
    async fn insert_pending(&self, new: &NewForgotTimeoutRequest) -> Result<u64, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO forgot_timeout_requests
                (attendance_record_id, student_id, reason, letter_file_path)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.attendance_record_id)
        .bind(new.student_id)
        .bind(&new.reason)
        .bind(new.letter_file_path.as_deref())
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.last_insert_id())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<ForgotTimeoutRequest>, RepoError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM forgot_timeout_requests WHERE id = ?");
        sqlx::query_as::<_, ForgotTimeoutRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn find_by_record(
        &self,
        attendance_record_id: u64,
    ) -> Result<Option<ForgotTimeoutRequest>, RepoError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM forgot_timeout_requests WHERE attendance_record_id = ?"
        );
        sqlx::query_as::<_, ForgotTimeoutRequest>(&sql)
            .bind(attendance_record_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn resolve_if_pending(
        &self,
        id: u64,
        status: RequestStatus,
        instructor_response: Option<&str>,
        reviewed_at: NaiveDateTime,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE forgot_timeout_requests
            SET status = ?, instructor_response = ?, reviewed_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(instructor_response)
        .bind(reviewed_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<u64>,
        limit: u64,
        offset: u64,
    ) -> Result<RequestPage, RepoError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        let status_str = status.map(|s| s.to_string());
        if let Some(s) = status_str.as_deref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(s));
        }

        if let Some(sid) = student_id {
            where_sql.push_str(" AND student_id = ?");
            args.push(FilterValue::U64(sid));
        }

        let count_sql = format!("SELECT COUNT(*) FROM forgot_timeout_requests{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }

        let total = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM forgot_timeout_requests{} \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            where_sql
        );

        let mut data_q = sqlx::query_as::<_, ForgotTimeoutRequest>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let data = data_q
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(RequestPage { data, total })
    }
}
