use serde::Serialize;
use utoipa::ToSchema;

use super::error::AttendanceError;
use crate::repo::ComplianceRepository;

/// Derived on each check, never stored.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ComplianceSnapshot {
    #[schema(example = 7)]
    pub approved: u32,
    #[schema(example = 7)]
    pub required: u32,
}

impl ComplianceSnapshot {
    pub fn allowed(&self) -> bool {
        self.approved >= self.required
    }
}

/// Gates every attendance read and write on document compliance. Read-only
/// and safe to call any number of times per request.
pub struct ComplianceGate<C> {
    repo: C,
    required: u32,
}

impl<C: ComplianceRepository> ComplianceGate<C> {
    pub fn new(repo: C, required: u32) -> Self {
        Self { repo, required }
    }

    pub async fn check_access(&self, student_id: u64) -> Result<ComplianceSnapshot, AttendanceError> {
        let approved = self.repo.approved_required_count(student_id).await?;
        let snapshot = ComplianceSnapshot { approved, required: self.required };
        if snapshot.allowed() {
            Ok(snapshot)
        } else {
            Err(AttendanceError::ComplianceRequired {
                approved: snapshot.approved,
                required: snapshot.required,
            })
        }
    }
}
