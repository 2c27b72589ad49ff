use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

/// Sentinel `toDate` meaning "currently in effect, no end date yet". At most
/// one period per (tenant, employee) carries it.
pub fn open_ended_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).expect("valid sentinel date")
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum EmploymentStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// One time-bounded salary configuration period for an employee. Periods for
/// the same (companyId, iqamaNo) never overlap; [fromDate, toDate] bounds are
/// inclusive at UTC day granularity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeConfig {
    pub id: Uuid,
    pub company_id: String,
    pub iqama_no: String,
    pub name: String,
    pub designation: Option<String>,
    pub status: EmploymentStatus,
    pub basic: f64,
    pub housing: f64,
    pub transport: f64,
    pub medical_insurance: f64,
    pub iqama_renewal_cost: f64,
    pub gosi: f64,
    pub fix: f64,
    pub saudization: f64,
    pub service_charge: f64,
    pub exit_fee: f64,
    pub exit_reentry_fee: f64,
    pub joining_date: NaiveDate,
    pub resignation_date: Option<NaiveDate>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeConfigInput {
    pub iqama_no: String,
    pub name: String,
    pub designation: Option<String>,
    pub status: Option<EmploymentStatus>,
    pub basic: Option<f64>,
    pub housing: Option<f64>,
    pub transport: Option<f64>,
    pub medical_insurance: Option<f64>,
    pub iqama_renewal_cost: Option<f64>,
    pub gosi: Option<f64>,
    pub fix: Option<f64>,
    pub saudization: Option<f64>,
    pub service_charge: Option<f64>,
    pub exit_fee: Option<f64>,
    pub exit_reentry_fee: Option<f64>,
    pub joining_date: Option<NaiveDate>,
    pub resignation_date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub use_default_fixed_salary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeConfigInput {
    pub iqama_no: Option<String>,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub status: Option<EmploymentStatus>,
    pub basic: Option<f64>,
    pub housing: Option<f64>,
    pub transport: Option<f64>,
    pub medical_insurance: Option<f64>,
    pub iqama_renewal_cost: Option<f64>,
    pub gosi: Option<f64>,
    pub fix: Option<f64>,
    pub saudization: Option<f64>,
    pub service_charge: Option<f64>,
    pub exit_fee: Option<f64>,
    pub exit_reentry_fee: Option<f64>,
    pub joining_date: Option<NaiveDate>,
    pub resignation_date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Normalized values for a period about to be inserted, after date
/// defaulting, fixed-salary merge, and policy zeroing have been applied.
#[derive(Debug, Clone)]
pub struct NewEmployeeConfig {
    pub company_id: String,
    pub iqama_no: String,
    pub name: String,
    pub designation: Option<String>,
    pub status: EmploymentStatus,
    pub basic: f64,
    pub housing: f64,
    pub transport: f64,
    pub medical_insurance: f64,
    pub iqama_renewal_cost: f64,
    pub gosi: f64,
    pub fix: f64,
    pub saudization: f64,
    pub service_charge: f64,
    pub exit_fee: f64,
    pub exit_reentry_fee: f64,
    pub joining_date: NaiveDate,
    pub resignation_date: Option<NaiveDate>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[cfg(test)]
impl EmployeeConfig {
    pub fn test_stub(company_id: &str, iqama_no: &str) -> Self {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        EmployeeConfig {
            id: Uuid::new_v4(),
            company_id: company_id.to_string(),
            iqama_no: iqama_no.to_string(),
            name: "Test Employee".to_string(),
            designation: None,
            status: EmploymentStatus::Active,
            basic: 0.0,
            housing: 0.0,
            transport: 0.0,
            medical_insurance: 0.0,
            iqama_renewal_cost: 0.0,
            gosi: 0.0,
            fix: 0.0,
            saudization: 0.0,
            service_charge: 0.0,
            exit_fee: 0.0,
            exit_reentry_fee: 0.0,
            joining_date: today,
            resignation_date: None,
            from_date: today,
            to_date: open_ended_date(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
impl CreateEmployeeConfigInput {
    pub fn test_stub(name: &str, iqama_no: &str) -> Self {
        CreateEmployeeConfigInput {
            iqama_no: iqama_no.to_string(),
            name: name.to_string(),
            designation: None,
            status: None,
            basic: None,
            housing: None,
            transport: None,
            medical_insurance: None,
            iqama_renewal_cost: None,
            gosi: None,
            fix: None,
            saudization: None,
            service_charge: None,
            exit_fee: None,
            exit_reentry_fee: None,
            joining_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            resignation_date: None,
            from_date: None,
            to_date: None,
            use_default_fixed_salary: false,
        }
    }
}
