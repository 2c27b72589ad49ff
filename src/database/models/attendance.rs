use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One attendance record per (companyId, iqamaNo, monthYear). The employee
/// name is a snapshot taken at creation time, kept for audit immutability.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub company_id: String,
    pub iqama_no: String,
    pub name: String,
    pub month_year: String,
    pub total_working_days: i32,
    pub days_present: i32,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub company_id: String,
    pub iqama_no: String,
    pub name: String,
    pub month_year: String,
    pub total_working_days: i32,
    pub days_present: i32,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceInput {
    pub iqama_no: String,
    pub month_year: String,
    pub days_present: i32,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceInput {
    pub days_present: i32,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceItem {
    pub iqama_no: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceReport {
    pub month_year: String,
    pub total_employees: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BulkAttendanceItem>,
}
