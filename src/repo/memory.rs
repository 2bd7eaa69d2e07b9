//! In-memory repositories backing the engine tests. The mutex gives the same
//! atomicity the MySQL unique key and conditional updates give in production.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::attendance::{AttendanceRecord, BlockType, NewAttendanceRecord};
use crate::model::forgot_timeout::{ForgotTimeoutRequest, NewForgotTimeoutRequest, RequestStatus};
use crate::model::profile::{ProgressStatus, StudentProfile};

use super::{
    AttendanceRepository, ComplianceRepository, ForgotTimeoutRepository, ProfileRepository,
    RepoError, RequestPage,
};

#[derive(Default)]
struct StoreInner {
    records: Vec<AttendanceRecord>,
    profiles: HashMap<u64, StudentProfile>,
    approved_documents: HashMap<u64, u32>,
    requests: Vec<ForgotTimeoutRequest>,
    next_record_id: u64,
    next_request_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap()
    }

    pub fn put_profile(&self, profile: StudentProfile) {
        self.lock().profiles.insert(profile.user_id, profile);
    }

    pub fn set_approved_documents(&self, student_id: u64, count: u32) {
        self.lock().approved_documents.insert(student_id, count);
    }

    pub fn profile(&self, user_id: u64) -> Option<StudentProfile> {
        self.lock().profiles.get(&user_id).cloned()
    }

    pub fn record(&self, id: u64) -> Option<AttendanceRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn attendance(&self) -> MemoryAttendanceRepo {
        MemoryAttendanceRepo(self.clone())
    }

    pub fn profiles(&self) -> MemoryProfileRepo {
        MemoryProfileRepo(self.clone())
    }

    pub fn compliance(&self) -> MemoryComplianceRepo {
        MemoryComplianceRepo(self.clone())
    }

    pub fn requests(&self) -> MemoryForgotTimeoutRepo {
        MemoryForgotTimeoutRepo(self.clone())
    }
}

#[derive(Clone)]
pub struct MemoryAttendanceRepo(MemoryStore);

impl AttendanceRepository for MemoryAttendanceRepo {
    async fn find_for_block(
        &self,
        student_id: u64,
        date: NaiveDate,
        block: BlockType,
    ) -> Result<Option<AttendanceRecord>, RepoError> {
        Ok(self
            .0
            .lock()
            .records
            .iter()
            .find(|r| r.student_id == student_id && r.date == date && r.block_type == block)
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, RepoError> {
        Ok(self.0.lock().records.iter().find(|r| r.id == id).cloned())
    }

    async fn records_for_day(
        &self,
        student_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, RepoError> {
        Ok(self
            .0
            .lock()
            .records
            .iter()
            .filter(|r| r.student_id == student_id && r.date == date)
            .cloned()
            .collect())
    }

    async fn insert_open(&self, new: &NewAttendanceRecord) -> Result<u64, RepoError> {
        let mut inner = self.0.lock();
        let duplicate = inner.records.iter().any(|r| {
            r.student_id == new.student_id && r.date == new.date && r.block_type == new.block_type
        });
        if duplicate {
            return Err(RepoError::Duplicate);
        }
        inner.next_record_id += 1;
        let id = inner.next_record_id;
        inner.records.push(new.clone().into_record(id));
        Ok(id)
    }

    async fn close_if_open(
        &self,
        record_id: u64,
        time_out: NaiveDateTime,
        hours_earned: f64,
    ) -> Result<bool, RepoError> {
        let mut inner = self.0.lock();
        match inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id && r.time_out.is_none())
        {
            Some(record) => {
                record.time_out = Some(time_out);
                record.hours_earned = hours_earned;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sum_closed_hours(&self, student_id: u64) -> Result<f64, RepoError> {
        Ok(self
            .0
            .lock()
            .records
            .iter()
            .filter(|r| r.student_id == student_id && r.time_out.is_some())
            .map(|r| r.hours_earned)
            .sum())
    }
}

#[derive(Clone)]
pub struct MemoryProfileRepo(MemoryStore);

impl ProfileRepository for MemoryProfileRepo {
    async fn find(&self, user_id: u64) -> Result<Option<StudentProfile>, RepoError> {
        Ok(self.0.lock().profiles.get(&user_id).cloned())
    }

    async fn update_progress(
        &self,
        user_id: u64,
        total_hours: f64,
        status: ProgressStatus,
    ) -> Result<(), RepoError> {
        if let Some(profile) = self.0.lock().profiles.get_mut(&user_id) {
            profile.total_hours_accumulated = total_hours;
            profile.status = status;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryComplianceRepo(MemoryStore);

impl ComplianceRepository for MemoryComplianceRepo {
    async fn approved_required_count(&self, student_id: u64) -> Result<u32, RepoError> {
        Ok(self
            .0
            .lock()
            .approved_documents
            .get(&student_id)
            .copied()
            .unwrap_or(0))
    }
}

#[derive(Clone)]
pub struct MemoryForgotTimeoutRepo(MemoryStore);

impl ForgotTimeoutRepository for MemoryForgotTimeoutRepo {
    async fn insert_pending(&self, new: &NewForgotTimeoutRequest) -> Result<u64, RepoError> {
        let mut inner = self.0.lock();
        let duplicate = inner
            .requests
            .iter()
            .any(|r| r.attendance_record_id == new.attendance_record_id);
        if duplicate {
            return Err(RepoError::Duplicate);
        }
        inner.next_request_id += 1;
        let id = inner.next_request_id;
        inner.requests.push(ForgotTimeoutRequest {
            id,
            attendance_record_id: new.attendance_record_id,
            student_id: new.student_id,
            reason: new.reason.clone(),
            letter_file_path: new.letter_file_path.clone(),
            status: RequestStatus::Pending,
            instructor_response: None,
            reviewed_at: None,
            created_at: None,
        });
        Ok(id)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<ForgotTimeoutRequest>, RepoError> {
        Ok(self.0.lock().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_record(
        &self,
        attendance_record_id: u64,
    ) -> Result<Option<ForgotTimeoutRequest>, RepoError> {
        Ok(self
            .0
            .lock()
            .requests
            .iter()
            .find(|r| r.attendance_record_id == attendance_record_id)
            .cloned())
    }

    async fn resolve_if_pending(
        &self,
        id: u64,
        status: RequestStatus,
        instructor_response: Option<&str>,
        reviewed_at: NaiveDateTime,
    ) -> Result<bool, RepoError> {
        let mut inner = self.0.lock();
        match inner
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        {
            Some(request) => {
                request.status = status;
                request.instructor_response = instructor_response.map(str::to_owned);
                request.reviewed_at = Some(reviewed_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<u64>,
        limit: u64,
        offset: u64,
    ) -> Result<RequestPage, RepoError> {
        let inner = self.0.lock();
        let matches: Vec<_> = inner
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .filter(|r| student_id.is_none_or(|sid| r.student_id == sid))
            .cloned()
            .collect();
        let total = matches.len() as i64;
        let data = matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(RequestPage { data, total })
    }
}
