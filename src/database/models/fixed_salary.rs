use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-tenant fixed-salary template, merged into newly created employee
/// configs when the creation payload opts in. Not versioned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FixedSalaryDefaults {
    pub id: Uuid,
    pub company_id: String,
    pub medical_insurance: f64,
    pub iqama_renewal_cost: f64,
    pub gosi: f64,
    pub fix: f64,
    pub saudization: f64,
    pub service_charge: f64,
    pub exit_fee: f64,
    pub exit_reentry_fee: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFixedSalaryInput {
    pub medical_insurance: f64,
    pub iqama_renewal_cost: f64,
    pub gosi: f64,
    pub fix: f64,
    pub saudization: f64,
    pub service_charge: f64,
    #[serde(default)]
    pub exit_fee: f64,
    #[serde(default)]
    pub exit_reentry_fee: f64,
}
