use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::AttendanceError;
use super::hours::{HoursAccumulator, PacingPolicy};
use super::round_hours;
use super::schedule::BlockSchedule;
use crate::model::forgot_timeout::{
    ForgotTimeoutRequest, NewForgotTimeoutRequest, RequestStatus,
};
use crate::model::profile::ProgressStatus;
use crate::repo::{
    AttendanceRepository, ForgotTimeoutRepository, ProfileRepository, RepoError, RequestPage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResolveDecision {
    Approved,
    Rejected,
}

/// How an approval assigns hours to the record it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HoursDecision {
    /// Close at the block-window end with the capped elapsed hours.
    KeepComputed,
    /// Close at the block-window end with zero hours.
    Zero,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResolveOutcome {
    pub status: RequestStatus,
    #[schema(example = 4.0)]
    pub hours_earned: Option<f64>,
    #[schema(example = 185.5)]
    pub total_hours: Option<f64>,
    pub progress: Option<ProgressStatus>,
}

/// Out-of-band closure of records a student left open: the student submits a
/// reasoned request, an instructor resolves it. State machine on the request:
/// None -> Pending -> {Approved, Rejected}, terminal either way.
pub struct ForgotTimeoutWorkflow<F, A, P> {
    requests: F,
    attendance: A,
    schedule: BlockSchedule,
    hours: HoursAccumulator<A, P>,
}

impl<F, A, P> ForgotTimeoutWorkflow<F, A, P>
where
    F: ForgotTimeoutRepository,
    A: AttendanceRepository + Clone,
    P: ProfileRepository,
{
    pub fn new(requests: F, attendance: A, profiles: P, schedule: BlockSchedule, pacing: PacingPolicy) -> Self {
        let hours = HoursAccumulator::new(attendance.clone(), profiles, pacing);
        Self { requests, attendance, schedule, hours }
    }

    /// A request may only target an open record owned by the requester, and
    /// each record takes at most one request over its lifetime.
    pub async fn submit(
        &self,
        student_id: u64,
        attendance_record_id: u64,
        reason: String,
        letter_file: Option<String>,
    ) -> Result<ForgotTimeoutRequest, AttendanceError> {
        let record = self
            .attendance
            .find_by_id(attendance_record_id)
            .await?
            .ok_or(AttendanceError::RecordMismatch)?;
        if record.student_id != student_id || !record.is_open() {
            return Err(AttendanceError::RecordMismatch);
        }
        if self.requests.find_by_record(record.id).await?.is_some() {
            return Err(AttendanceError::RequestAlreadyExists);
        }

        let letter_file_path =
            letter_file.map(|name| format!("letters/{}_{}", Uuid::new_v4(), name));
        let new = NewForgotTimeoutRequest {
            attendance_record_id: record.id,
            student_id,
            reason,
            letter_file_path,
        };
        // The unique key on attendance_record_id backstops the check above
        let id = match self.requests.insert_pending(&new).await {
            Ok(id) => id,
            Err(RepoError::Duplicate) => return Err(AttendanceError::RequestAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            student_id,
            attendance_record_id,
            request_id = id,
            "forgot-timeout request submitted"
        );
        Ok(ForgotTimeoutRequest {
            id,
            attendance_record_id: new.attendance_record_id,
            student_id,
            reason: new.reason,
            letter_file_path: new.letter_file_path,
            status: RequestStatus::Pending,
            instructor_response: None,
            reviewed_at: None,
            created_at: None,
        })
    }

    /// Terminal resolution. Approval closes the linked record at its block
    /// window end; rejection leaves the record open with no resubmission
    /// path (administrative override is the only way forward).
    pub async fn resolve(
        &self,
        request_id: u64,
        reviewer_id: u64,
        decision: ResolveDecision,
        hours_decision: Option<HoursDecision>,
        response: Option<String>,
        now: NaiveDateTime,
    ) -> Result<ResolveOutcome, AttendanceError> {
        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(AttendanceError::RecordMismatch)?;
        if request.status != RequestStatus::Pending {
            return Err(AttendanceError::AlreadyClosed);
        }

        match decision {
            ResolveDecision::Rejected => {
                let resolved = self
                    .requests
                    .resolve_if_pending(request_id, RequestStatus::Rejected, response.as_deref(), now)
                    .await?;
                if !resolved {
                    return Err(AttendanceError::AlreadyClosed);
                }
                tracing::info!(request_id, reviewer_id, "forgot-timeout request rejected");
                Ok(ResolveOutcome {
                    status: RequestStatus::Rejected,
                    hours_earned: None,
                    total_hours: None,
                    progress: None,
                })
            }
            ResolveDecision::Approved => {
                let record = self
                    .attendance
                    .find_by_id(request.attendance_record_id)
                    .await?
                    .ok_or(AttendanceError::RecordMismatch)?;
                let time_in = record.time_in.ok_or(AttendanceError::RecordMismatch)?;
                if record.time_out.is_some() {
                    return Err(AttendanceError::RecordMismatch);
                }

                let def = self.schedule.definition(record.block_type);
                let close_at = record.date.and_time(def.end);
                let hours_earned = match hours_decision.unwrap_or(HoursDecision::KeepComputed) {
                    HoursDecision::Zero => 0.0,
                    HoursDecision::KeepComputed => {
                        let elapsed = (close_at - time_in).num_seconds() as f64 / 3600.0;
                        round_hours(elapsed.min(def.window_hours()).max(0.0))
                    }
                };

                let resolved = self
                    .requests
                    .resolve_if_pending(request_id, RequestStatus::Approved, response.as_deref(), now)
                    .await?;
                if !resolved {
                    return Err(AttendanceError::AlreadyClosed);
                }
                if !self.attendance.close_if_open(record.id, close_at, hours_earned).await? {
                    // The record was closed through another path after the
                    // ownership check; the recompute below still lands on
                    // the correct total.
                    tracing::warn!(request_id, record_id = record.id, "record already closed at approval");
                }

                let (total_hours, progress) =
                    self.hours.refresh(record.student_id, now.date()).await?;
                tracing::info!(
                    request_id,
                    reviewer_id,
                    record_id = record.id,
                    hours_earned,
                    "forgot-timeout request approved"
                );
                Ok(ResolveOutcome {
                    status: RequestStatus::Approved,
                    hours_earned: Some(hours_earned),
                    total_hours: Some(total_hours),
                    progress: Some(progress),
                })
            }
        }
    }

    pub async fn list(
        &self,
        status: Option<RequestStatus>,
        student_id: Option<u64>,
        limit: u64,
        offset: u64,
    ) -> Result<RequestPage, AttendanceError> {
        Ok(self.requests.list(status, student_id, limit, offset).await?)
    }
}
