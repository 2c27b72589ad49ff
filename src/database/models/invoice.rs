use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Earning,
    Deduction,
}

/// Ad hoc invoice line item supplied at generation time, e.g. a one-off
/// bonus or a deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceComponent {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSnapshot {
    pub total_working_days: i32,
    pub days_present: i32,
    pub proration_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BaseSalarySnapshot {
    pub basic: f64,
    pub housing: f64,
    pub transport: f64,
    pub prorate_service_charge: f64,
}

impl BaseSalarySnapshot {
    pub fn has_nan(&self) -> bool {
        self.basic.is_nan()
            || self.housing.is_nan()
            || self.transport.is_nan()
            || self.prorate_service_charge.is_nan()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostSnapshot {
    pub medical_insurance: f64,
    pub iqama_renewal_cost: f64,
    pub gosi: f64,
    pub fix: f64,
    pub saudization: f64,
    pub service_charge: f64,
    pub exit_fee: f64,
    pub exit_reentry_fee: f64,
}

impl FixedCostSnapshot {
    pub fn total(&self) -> f64 {
        self.medical_insurance
            + self.iqama_renewal_cost
            + self.gosi
            + self.fix
            + self.saudization
            + self.service_charge
            + self.exit_fee
            + self.exit_reentry_fee
    }

    pub fn has_nan(&self) -> bool {
        self.total().is_nan()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub gross_earnings: f64,
    pub total_deductions: f64,
    pub net_payable: f64,
}

/// The single live invoice document for one (companyId, iqamaNo, monthYear).
/// Regeneration while the month is editable replaces it in place and bumps
/// `version`; once `is_final` is set it never changes again.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub company_id: String,
    pub invoice_no: String,
    pub iqama_no: String,
    pub employee_name: String,
    pub designation: Option<String>,
    pub month_year: String,
    pub version: i32,
    pub is_final: bool,
    #[sqlx(flatten)]
    pub attendance_snapshot: AttendanceSnapshot,
    #[sqlx(flatten)]
    pub base_salary: BaseSalarySnapshot,
    #[sqlx(flatten)]
    pub fixed_costs: FixedCostSnapshot,
    pub extra_components: Json<Vec<InvoiceComponent>>,
    pub gross_earnings: f64,
    pub total_deductions: f64,
    pub net_payable: f64,
    pub remarks: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub replaced_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Computed invoice fields ready to be inserted or to replace the existing
/// document in place.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub company_id: String,
    pub invoice_no: String,
    pub iqama_no: String,
    pub employee_name: String,
    pub designation: Option<String>,
    pub month_year: String,
    pub version: i32,
    pub is_final: bool,
    pub attendance_snapshot: AttendanceSnapshot,
    pub base_salary: BaseSalarySnapshot,
    pub fixed_costs: FixedCostSnapshot,
    pub extra_components: Vec<InvoiceComponent>,
    pub gross_earnings: f64,
    pub total_deductions: f64,
    pub net_payable: f64,
    pub remarks: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub replaced_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInvoiceInput {
    pub iqama_no: String,
    pub month_year: String,
    pub days_present: Option<i32>,
    pub attendance_remarks: Option<String>,
    pub invoice_remarks: Option<String>,
    #[serde(default)]
    pub extra_components: Vec<InvoiceComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkGenerateInput {
    pub month_year: String,
    /// Restrict the run to these employees; omitted means the whole active
    /// roster for the month.
    pub iqama_nos: Option<Vec<String>>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub extra_components: std::collections::HashMap<String, Vec<InvoiceComponent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkGenerateItem {
    pub iqama_no: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkGenerateReport {
    pub month_year: String,
    pub total_employees: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BulkGenerateItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatus {
    pub invoice_exist: bool,
    pub attendance_exist: bool,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInvoiceStatus {
    pub iqama_no: String,
    pub employee_name: String,
    #[serde(flatten)]
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizationStats {
    pub total_invoices: i64,
    pub finalized_invoices: i64,
    pub pending_finalization: i64,
    pub past_months_pending: Vec<String>,
    pub current_month_invoices: i64,
    pub future_month_invoices: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeReport {
    pub finalized_count: u64,
    pub months_finalized: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn invoice_component_uses_original_wire_names() {
        let component = InvoiceComponent {
            key: "service_fee".to_string(),
            label: "Service Fee".to_string(),
            component_type: ComponentType::Earning,
            amount: 120.5,
        };

        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": "service_fee",
                "label": "Service Fee",
                "type": "earning",
                "amount": 120.5
            })
        );

        let parsed: InvoiceComponent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.component_type, ComponentType::Earning);
    }

    #[test]
    fn fixed_cost_total_sums_every_bucket() {
        let costs = FixedCostSnapshot {
            medical_insurance: 1.0,
            iqama_renewal_cost: 2.0,
            gosi: 3.0,
            fix: 4.0,
            saudization: 5.0,
            service_charge: 6.0,
            exit_fee: 7.0,
            exit_reentry_fee: 8.0,
        };
        assert_eq!(costs.total(), 36.0);
        assert!(!costs.has_nan());
    }
}
