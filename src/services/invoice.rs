use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::{
    models::{
        AttendanceRecord, AttendanceSnapshot, BulkGenerateInput, BulkGenerateItem,
        BulkGenerateReport, EmployeeConfig, EmployeeInvoiceStatus, FinalizationStats,
        FinalizeReport, GenerateInvoiceInput, Invoice, InvoiceComponent, InvoiceStatus,
        NewAttendance, NewInvoice,
    },
    repositories::{AttendanceRepository, EmployeeConfigRepository, InvoiceRepository},
};
use crate::domain::{CompanyPolicy, MonthLabel, proration::calculate_proration_ratio};
use crate::error::AppError;

use super::require_tenant;

/// Versioned invoice generation. One live document per (tenant, employee,
/// month); regenerating an editable month replaces it in place, a month that
/// has rolled into the past is swept into the finalized state and locked.
#[derive(Clone)]
pub struct InvoiceService {
    pool: PgPool,
    invoices: InvoiceRepository,
    attendance: AttendanceRepository,
    configs: EmployeeConfigRepository,
}

enum GenerateOutcome {
    /// The invoice was inserted or replaced inside the transaction.
    Written(Invoice),
    /// The month is locked; the stored invoice is returned unchanged.
    Locked(Invoice),
}

impl InvoiceService {
    pub fn new(
        pool: PgPool,
        invoices: InvoiceRepository,
        attendance: AttendanceRepository,
        configs: EmployeeConfigRepository,
    ) -> Self {
        Self {
            pool,
            invoices,
            attendance,
            configs,
        }
    }

    /// Best-effort sweep marking every invoice of a closed month as final.
    /// Failures are logged and swallowed so generation never blocks on the
    /// sweep.
    pub async fn finalize_past_invoices(&self, company_id: &str) {
        if let Err(err) = self.finalize_past(company_id).await {
            log::error!("Finalization sweep failed for {}: {}", company_id, err);
        }
    }

    /// The sweep as an explicit operation, reporting what it touched.
    pub async fn manually_finalize(&self, company_id: &str) -> Result<FinalizeReport, AppError> {
        let tenant = require_tenant(company_id)?;
        self.finalize_past(tenant).await
    }

    async fn finalize_past(&self, tenant: &str) -> Result<FinalizeReport, AppError> {
        let current = MonthLabel::current();
        let months = self.invoices.distinct_unfinalized_months(&self.pool, tenant).await?;
        let past_months = filter_past_months(&months, current);

        if past_months.is_empty() {
            return Ok(FinalizeReport {
                finalized_count: 0,
                months_finalized: Vec::new(),
            });
        }

        let finalized_count = self
            .invoices
            .finalize_months(&self.pool, tenant, &past_months)
            .await?;

        if finalized_count > 0 {
            log::info!(
                "Finalized {} invoice(s) for {} across {:?}",
                finalized_count,
                tenant,
                past_months
            );
        }

        Ok(FinalizeReport {
            finalized_count,
            months_finalized: past_months,
        })
    }

    pub async fn generate_invoice(
        &self,
        company_id: &str,
        input: GenerateInvoiceInput,
    ) -> Result<Invoice, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(&input.month_year)?;
        validate_components(&input.extra_components)?;

        self.finalize_past_invoices(tenant).await;

        self.generate_one(
            tenant,
            &input.iqama_no,
            month,
            input.days_present,
            input.attendance_remarks.as_deref(),
            input.invoice_remarks.clone(),
            &input.extra_components,
        )
        .await
    }

    /// Generate for every requested employee, collecting per-employee
    /// failures instead of aborting the run. Attendance is forced to full
    /// presence for the month, overwriting any editable record.
    pub async fn bulk_generate(
        &self,
        company_id: &str,
        input: BulkGenerateInput,
    ) -> Result<BulkGenerateReport, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(&input.month_year)?;

        for components in input.extra_components.values() {
            validate_components(components)?;
        }

        self.finalize_past_invoices(tenant).await;

        let targets = match input.iqama_nos {
            Some(list) => list,
            None => self
                .configs
                .find_active_roster(tenant, month.last_day())
                .await?
                .into_iter()
                .map(|config| config.iqama_no)
                .collect(),
        };

        let empty: Vec<InvoiceComponent> = Vec::new();
        let days_present = bulk_attendance(month);
        let mut results = Vec::with_capacity(targets.len());
        for iqama_no in targets {
            let components = input.extra_components.get(&iqama_no).unwrap_or(&empty);
            let outcome = self
                .generate_one(
                    tenant,
                    &iqama_no,
                    month,
                    days_present,
                    Some("Bulk auto attendance"),
                    input.remarks.clone(),
                    components,
                )
                .await;

            results.push(match outcome {
                Ok(invoice) => BulkGenerateItem {
                    iqama_no,
                    success: true,
                    invoice: Some(invoice),
                    error: None,
                },
                Err(err) => {
                    log::warn!(
                        "Bulk generation failed for {}/{} in {}: {}",
                        tenant,
                        iqama_no,
                        month,
                        err
                    );
                    BulkGenerateItem {
                        iqama_no,
                        success: false,
                        invoice: None,
                        error: Some(err.to_string()),
                    }
                }
            });
        }

        let success_count = results.iter().filter(|item| item.success).count();
        Ok(BulkGenerateReport {
            month_year: month.to_string(),
            total_employees: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
        })
    }

    /// Remove a non-final invoice and its attendance record together.
    pub async fn delete_invoice(
        &self,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<(), AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        let mut tx = self.pool.begin().await?;

        let invoice = self
            .invoices
            .find(&mut *tx, tenant, iqama_no, &month.to_string())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No invoice for {}/{} in {}", tenant, iqama_no, month))
            })?;

        if invoice.is_final {
            return Err(AppError::ImmutableState(format!(
                "Invoice {} is finalized and cannot be deleted",
                invoice.invoice_no
            )));
        }
        if !month.is_editable() {
            return Err(AppError::ImmutableState(format!(
                "Invoices for {} can no longer be deleted",
                month
            )));
        }

        self.invoices.delete(&mut *tx, invoice.id).await?;
        self.attendance
            .delete(&mut *tx, tenant, iqama_no, &month.to_string())
            .await?;

        tx.commit().await?;
        log::info!("Deleted invoice {} and its attendance", invoice.invoice_no);
        Ok(())
    }

    pub async fn get_invoice(
        &self,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<Invoice, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        self.invoices
            .find(&self.pool, tenant, iqama_no, &month.to_string())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No invoice for {}/{} in {}", tenant, iqama_no, month))
            })
    }

    /// All invoices for one employee, newest month first.
    pub async fn get_invoices_for_employee(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<Invoice>, AppError> {
        let tenant = require_tenant(company_id)?;

        let mut invoices = self.invoices.find_all_for_employee(tenant, iqama_no).await?;
        invoices.sort_by(|a, b| {
            let left = MonthLabel::parse(&a.month_year).ok();
            let right = MonthLabel::parse(&b.month_year).ok();
            right.cmp(&left)
        });
        Ok(invoices)
    }

    pub async fn get_invoices_for_month(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<Invoice>, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;
        Ok(self.invoices.find_for_month(tenant, &month.to_string()).await?)
    }

    /// Per-employee generation status for one month, across every employee
    /// with a config period covering that month.
    pub async fn get_status_for_all_employees(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<EmployeeInvoiceStatus>, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;
        let editable = month.is_editable();

        let configs = self
            .configs
            .find_for_period(&self.pool, tenant, month.first_day(), month.last_day())
            .await?;
        let invoices = self.invoices.find_for_month(tenant, &month.to_string()).await?;
        let attendance = self.attendance.find_for_month(tenant, &month.to_string()).await?;

        let statuses = configs
            .into_iter()
            .map(|config| {
                let invoice = invoices.iter().find(|inv| inv.iqama_no == config.iqama_no);
                let attendance_exist = attendance
                    .iter()
                    .any(|record| record.iqama_no == config.iqama_no);

                EmployeeInvoiceStatus {
                    iqama_no: config.iqama_no,
                    employee_name: config.name,
                    status: InvoiceStatus {
                        invoice_exist: invoice.is_some(),
                        attendance_exist,
                        last_generated_at: invoice.map(|inv| inv.generated_at),
                        is_locked: !editable || invoice.is_some_and(|inv| inv.is_final),
                    },
                }
            })
            .collect();

        Ok(statuses)
    }

    pub async fn get_finalization_stats(
        &self,
        company_id: &str,
    ) -> Result<FinalizationStats, AppError> {
        let tenant = require_tenant(company_id)?;
        let current = MonthLabel::current();

        let total_invoices = self.invoices.count_all(tenant).await?;
        let finalized_invoices = self.invoices.count_final(tenant).await?;
        let unfinalized_months = self
            .invoices
            .distinct_unfinalized_months(&self.pool, tenant)
            .await?;
        let past_months_pending = filter_past_months(&unfinalized_months, current);

        let current_month_invoices = self
            .invoices
            .count_for_month(tenant, &current.to_string())
            .await?;

        let mut future_month_invoices = 0;
        for label in self.invoices.distinct_months(tenant).await? {
            if let Ok(month) = MonthLabel::parse(&label) {
                if month > current {
                    future_month_invoices +=
                        self.invoices.count_for_month(tenant, &label).await?;
                }
            }
        }

        Ok(FinalizationStats {
            total_invoices,
            finalized_invoices,
            pending_finalization: total_invoices - finalized_invoices,
            past_months_pending,
            current_month_invoices,
            future_month_invoices,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_one(
        &self,
        tenant: &str,
        iqama_no: &str,
        month: MonthLabel,
        days_present: Option<i32>,
        attendance_remarks: Option<&str>,
        invoice_remarks: Option<String>,
        extra_components: &[InvoiceComponent],
    ) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;

        let outcome = self
            .generate_within(
                &mut tx,
                tenant,
                iqama_no,
                month,
                days_present,
                attendance_remarks,
                invoice_remarks,
                extra_components,
            )
            .await;

        match outcome {
            Ok(GenerateOutcome::Written(invoice)) => {
                tx.commit().await?;
                Ok(invoice)
            }
            Ok(GenerateOutcome::Locked(invoice)) => {
                tx.rollback().await?;
                log::info!(
                    "Returning locked invoice {} for {}/{} in {}",
                    invoice.invoice_no,
                    tenant,
                    iqama_no,
                    month
                );
                Ok(invoice)
            }
            Err(err) => {
                if err.is_internal() {
                    log::error!(
                        "Invoice generation failed for {}/{} in {}: {}",
                        tenant,
                        iqama_no,
                        month,
                        err
                    );
                }
                if let Err(rollback_err) = tx.rollback().await {
                    log::warn!("Rollback failed after generation error: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_within(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: &str,
        iqama_no: &str,
        month: MonthLabel,
        days_present: Option<i32>,
        attendance_remarks: Option<&str>,
        invoice_remarks: Option<String>,
        extra_components: &[InvoiceComponent],
    ) -> Result<GenerateOutcome, AppError> {
        let month_label = month.to_string();
        let editable = month.is_editable();

        let existing = self
            .invoices
            .find(&mut **tx, tenant, iqama_no, &month_label)
            .await?;

        if let Some(invoice) = &existing {
            if !editable || invoice.is_final {
                return Ok(GenerateOutcome::Locked(invoice.clone()));
            }
        }

        let config = self
            .configs
            .find_overlapping(&mut **tx, tenant, iqama_no, month.first_day(), month.last_day())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No employee config for {}/{} in {}",
                    tenant, iqama_no, month
                ))
            })?;

        let attendance = self
            .ensure_attendance(tx, &config, month, days_present, attendance_remarks, editable)
            .await?;

        let ratio = calculate_proration_ratio(
            attendance.total_working_days,
            attendance.days_present,
        )?;

        let policy = CompanyPolicy::resolve_or_default(tenant);
        let (base_salary, fixed_costs) = policy.salary_snapshot(&config, ratio)?;
        let totals = policy.compute_totals(&base_salary, &fixed_costs, extra_components)?;

        let version = existing.as_ref().map(|inv| inv.version + 1).unwrap_or(1);
        let now = Utc::now();

        let new_invoice = NewInvoice {
            company_id: tenant.to_string(),
            invoice_no: build_invoice_no(tenant, &month_label, iqama_no, version),
            iqama_no: iqama_no.to_string(),
            employee_name: config.name.clone(),
            designation: config.designation.clone(),
            month_year: month_label,
            version,
            is_final: !editable,
            attendance_snapshot: AttendanceSnapshot {
                total_working_days: attendance.total_working_days,
                days_present: attendance.days_present,
                proration_ratio: ratio,
            },
            base_salary,
            fixed_costs,
            extra_components: extra_components.to_vec(),
            gross_earnings: totals.gross_earnings,
            total_deductions: totals.total_deductions,
            net_payable: totals.net_payable,
            remarks: invoice_remarks,
            generated_at: now,
            replaced_at: existing.as_ref().map(|_| now),
            finalized_at: finalized_at_for(editable, now),
        };

        let written = match existing {
            Some(invoice) => self.invoices.replace(&mut **tx, invoice.id, &new_invoice).await?,
            None => self.invoices.insert(&mut **tx, &new_invoice).await?,
        };

        Ok(GenerateOutcome::Written(written))
    }

    /// Reuse, update, or create the attendance record backing an invoice.
    async fn ensure_attendance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        config: &EmployeeConfig,
        month: MonthLabel,
        days_present: Option<i32>,
        remarks: Option<&str>,
        editable: bool,
    ) -> Result<AttendanceRecord, AppError> {
        let month_label = month.to_string();
        let existing = self
            .attendance
            .find(&mut **tx, &config.company_id, &config.iqama_no, &month_label)
            .await?;

        match (existing, days_present) {
            (Some(record), None) => Ok(record),
            (Some(record), Some(days)) => {
                if !editable {
                    return Err(AppError::ImmutableState(format!(
                        "Attendance for {} can no longer be changed",
                        month
                    )));
                }
                check_days(days, record.total_working_days)?;
                let updated = self
                    .attendance
                    .update_in_place(
                        &mut **tx,
                        &config.company_id,
                        &config.iqama_no,
                        &month_label,
                        record.total_working_days,
                        days,
                        remarks.or(record.remarks.as_deref()),
                    )
                    .await?;
                Ok(updated)
            }
            (None, None) => Err(AppError::validation(format!(
                "No attendance recorded for {} and daysPresent was not provided",
                month
            ))),
            (None, Some(days)) => {
                if !editable {
                    return Err(AppError::ImmutableState(format!(
                        "Attendance for {} can no longer be created",
                        month
                    )));
                }
                let total = month.days_in_month() as i32;
                check_days(days, total)?;
                let created = self
                    .attendance
                    .insert(
                        &mut **tx,
                        &NewAttendance {
                            company_id: config.company_id.clone(),
                            iqama_no: config.iqama_no.clone(),
                            name: config.name.clone(),
                            month_year: month_label,
                            total_working_days: total,
                            days_present: days,
                            remarks: remarks.map(str::to_string),
                        },
                    )
                    .await?;
                Ok(created)
            }
        }
    }
}

/// Bulk runs always supply the month's full day count, so an existing
/// editable attendance record is rewritten to full presence.
fn bulk_attendance(month: MonthLabel) -> Option<i32> {
    Some(month.days_in_month() as i32)
}

fn check_days(days_present: i32, total_working_days: i32) -> Result<(), AppError> {
    if days_present < 0 || days_present > total_working_days {
        return Err(AppError::validation(format!(
            "daysPresent must be between 0 and {}, got {}",
            total_working_days, days_present
        )));
    }
    Ok(())
}

fn build_invoice_no(tenant: &str, month_label: &str, iqama_no: &str, version: i32) -> String {
    format!("INV-{}-{}-{}-{}", tenant, month_label, iqama_no, version)
}

fn finalized_at_for(editable: bool, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if editable { None } else { Some(now) }
}

/// Keep only parseable labels strictly before the current month.
fn filter_past_months(months: &[String], current: MonthLabel) -> Vec<String> {
    months
        .iter()
        .filter(|label| match MonthLabel::parse(label) {
            Ok(month) => month < current,
            Err(_) => {
                log::warn!("Skipping unparseable month label '{}'", label);
                false
            }
        })
        .cloned()
        .collect()
}

fn validate_components(components: &[InvoiceComponent]) -> Result<(), AppError> {
    for component in components {
        if component.key.trim().is_empty() || component.label.trim().is_empty() {
            return Err(AppError::validation(
                "Extra components need a non-empty key and label",
            ));
        }
        if !component.amount.is_finite() || component.amount < 0.0 {
            return Err(AppError::validation(format!(
                "Extra component '{}' has an invalid amount: {}",
                component.key, component.amount
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ComponentType;
    use pretty_assertions::assert_eq;

    #[test]
    fn invoice_numbers_embed_identity_and_version() {
        assert_eq!(
            build_invoice_no("bluebinaries", "January-2026", "1234567890", 3),
            "INV-bluebinaries-January-2026-1234567890-3"
        );
    }

    #[test]
    fn only_past_months_survive_the_filter() {
        let months = vec![
            "January-2025".to_string(),
            "June-2025".to_string(),
            "July-2025".to_string(),
            "not-a-month".to_string(),
        ];
        let past = filter_past_months(&months, MonthLabel::new(2025, 6).unwrap());
        assert_eq!(past, vec!["January-2025".to_string()]);
    }

    #[test]
    fn components_with_negative_or_nonfinite_amounts_are_rejected() {
        let component = |amount: f64| InvoiceComponent {
            key: "bonus".to_string(),
            label: "Bonus".to_string(),
            component_type: ComponentType::Earning,
            amount,
        };

        assert!(validate_components(&[component(100.0)]).is_ok());
        assert!(validate_components(&[component(-1.0)]).is_err());
        assert!(validate_components(&[component(f64::NAN)]).is_err());
        assert!(validate_components(&[component(f64::INFINITY)]).is_err());
    }

    #[test]
    fn blank_component_keys_are_rejected() {
        let component = InvoiceComponent {
            key: "  ".to_string(),
            label: "Bonus".to_string(),
            component_type: ComponentType::Earning,
            amount: 10.0,
        };
        assert!(validate_components(&[component]).is_err());
    }

    #[test]
    fn bulk_runs_always_force_full_attendance() {
        // Never None: recorded attendance for the month is overwritten with
        // full presence, not reused.
        assert_eq!(bulk_attendance(MonthLabel::new(2025, 2).unwrap()), Some(28));
        assert_eq!(bulk_attendance(MonthLabel::new(2024, 2).unwrap()), Some(29));
        assert_eq!(bulk_attendance(MonthLabel::new(2025, 6).unwrap()), Some(30));
        assert_eq!(bulk_attendance(MonthLabel::new(2026, 1).unwrap()), Some(31));
    }

    #[test]
    fn finalized_timestamp_only_set_when_locked() {
        let now = Utc::now();
        assert_eq!(finalized_at_for(true, now), None);
        assert_eq!(finalized_at_for(false, now), Some(now));
    }
}
