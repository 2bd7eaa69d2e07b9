use crate::api::attendance::{LocationQuery, TimeInRequest, TimeOutRequest};
use crate::api::forgot_timeout::{
    RequestFilter, RequestListResponse, ResolveRequest, SubmitRequest,
};
use crate::core::compliance::ComplianceSnapshot;
use crate::core::forgot_timeout::{HoursDecision, ResolveDecision};
use crate::core::geofence::Coordinate;
use crate::core::recorder::{BlockOverview, ProgressSummary, TimeOutOutcome};
use crate::model::attendance::{AttendanceRecord, BlockType};
use crate::model::forgot_timeout::{ForgotTimeoutRequest, RequestStatus};
use crate::model::profile::{ProgressStatus, StudentProfile};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OJT Portal API",
        version = "1.0.0",
        description = r#"
## On-the-Job-Training Attendance & Compliance API

This API powers the attendance core of a school-managed OJT tracking portal.

### Key Features
- **Block Attendance**
  - Time-in and time-out inside fixed morning / afternoon / overtime windows
- **Geofenced Clocking**
  - Clock actions are only accepted within a configured radius of the
    registered workplace (haversine distance)
- **Document Compliance Gate**
  - Every attendance action requires the full set of approved required
    documents
- **Hours Accrual**
  - Earned hours are capped to the block window and accumulate toward the
    600-hour requirement with a pacing status
- **Forgot-Timeout Workflow**
  - Students request retroactive closure of an open record; instructors
    approve or reject

### Security
All endpoints are protected with **JWT Bearer authentication** issued by the
portal's auth service. Resolution endpoints require the **Instructor** or
**Admin** role.

### Response Format
Every action returns `{"success": bool, "message": string, ...}`; failed
compliance checks additionally carry a `redirect` hint to the document
submission page.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::time_in,
        crate::api::attendance::time_out,
        crate::api::attendance::check_location,
        crate::api::attendance::blocks,
        crate::api::attendance::progress,

        crate::api::forgot_timeout::submit,
        crate::api::forgot_timeout::resolve,
        crate::api::forgot_timeout::list
    ),
    components(
        schemas(
            TimeInRequest,
            TimeOutRequest,
            LocationQuery,
            SubmitRequest,
            ResolveRequest,
            RequestFilter,
            RequestListResponse,
            AttendanceRecord,
            BlockType,
            ForgotTimeoutRequest,
            RequestStatus,
            ResolveDecision,
            HoursDecision,
            StudentProfile,
            ProgressStatus,
            ProgressSummary,
            BlockOverview,
            TimeOutOutcome,
            Coordinate,
            ComplianceSnapshot
        )
    ),
    tags(
        (name = "Attendance", description = "Block time-in/time-out, geofence checks, and progress"),
        (name = "ForgotTimeout", description = "Retroactive closure of open records"),
    )
)]
pub struct ApiDoc;
