use chrono::NaiveDate;
use sqlx::PgPool;

use crate::database::{
    models::{
        AttendanceRecord, BulkAttendanceItem, BulkAttendanceReport, CreateAttendanceInput,
        EmployeeConfig, NewAttendance, UpdateAttendanceInput,
    },
    repositories::{AttendanceRepository, EmployeeConfigRepository, InvoiceRepository},
};
use crate::domain::MonthLabel;
use crate::error::AppError;

use super::require_tenant;

/// Monthly attendance ledger. Records are editable only while their month
/// has not rolled into the past.
#[derive(Clone)]
pub struct AttendanceService {
    pool: PgPool,
    attendance: AttendanceRepository,
    configs: EmployeeConfigRepository,
    invoices: InvoiceRepository,
}

impl AttendanceService {
    pub fn new(
        pool: PgPool,
        attendance: AttendanceRepository,
        configs: EmployeeConfigRepository,
        invoices: InvoiceRepository,
    ) -> Self {
        Self {
            pool,
            attendance,
            configs,
            invoices,
        }
    }

    pub async fn create_attendance(
        &self,
        company_id: &str,
        input: CreateAttendanceInput,
    ) -> Result<AttendanceRecord, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(&input.month_year)?;

        let config = self
            .config_for_month(tenant, &input.iqama_no, month)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No employee config for {}/{} in {}",
                    tenant, input.iqama_no, month
                ))
            })?;

        check_employment_window(&config, month)?;

        let total_working_days = month.days_in_month() as i32;
        check_days_present(input.days_present, total_working_days)?;

        let record = self
            .attendance
            .insert(
                &self.pool,
                &NewAttendance {
                    company_id: tenant.to_string(),
                    iqama_no: input.iqama_no.clone(),
                    name: config.name.clone(),
                    month_year: month.to_string(),
                    total_working_days,
                    days_present: input.days_present,
                    remarks: input.remarks,
                },
            )
            .await?;

        Ok(record)
    }

    pub async fn update_attendance(
        &self,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
        input: UpdateAttendanceInput,
    ) -> Result<AttendanceRecord, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        if !month.is_editable() {
            return Err(AppError::ImmutableState(format!(
                "Attendance for {} can no longer be changed",
                month
            )));
        }

        let existing = self
            .attendance
            .find(&self.pool, tenant, iqama_no, &month.to_string())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No attendance for {}/{} in {}",
                    tenant, iqama_no, month
                ))
            })?;

        check_days_present(input.days_present, existing.total_working_days)?;

        let updated = self
            .attendance
            .update_in_place(
                &self.pool,
                tenant,
                iqama_no,
                &month.to_string(),
                existing.total_working_days,
                input.days_present,
                input.remarks.as_deref(),
            )
            .await?;

        Ok(updated)
    }

    /// Delete one attendance record. Blocked while a finalized invoice
    /// references the month or the month itself is already locked.
    pub async fn delete_attendance(
        &self,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<(), AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        if !month.is_editable() {
            return Err(AppError::ImmutableState(format!(
                "Attendance for {} can no longer be changed",
                month
            )));
        }

        if let Some(invoice) = self
            .invoices
            .find(&self.pool, tenant, iqama_no, &month.to_string())
            .await?
        {
            if invoice.is_final {
                return Err(AppError::ImmutableState(format!(
                    "Invoice {} is finalized; its attendance cannot be deleted",
                    invoice.invoice_no
                )));
            }
        }

        let deleted = self
            .attendance
            .delete(&self.pool, tenant, iqama_no, &month.to_string())
            .await?;
        if deleted == 0 {
            return Err(AppError::not_found(format!(
                "No attendance for {}/{} in {}",
                tenant, iqama_no, month
            )));
        }

        Ok(())
    }

    pub async fn get_attendance(
        &self,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<AttendanceRecord, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        self.attendance
            .find(&self.pool, tenant, iqama_no, &month.to_string())
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No attendance for {}/{} in {}",
                    tenant, iqama_no, month
                ))
            })
    }

    /// All records for one employee, newest month first.
    pub async fn get_all_for_employee(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let tenant = require_tenant(company_id)?;

        let mut records = self.attendance.find_all_for_employee(tenant, iqama_no).await?;
        sort_by_month_desc(&mut records, |record| record.month_year.as_str());
        Ok(records)
    }

    pub async fn get_for_month(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;
        Ok(self.attendance.find_for_month(tenant, &month.to_string()).await?)
    }

    /// Months from joining up to the last closed month that still have no
    /// attendance record, in chronological order.
    pub async fn pending_months(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<MonthLabel>, AppError> {
        let tenant = require_tenant(company_id)?;

        let config = self
            .configs
            .find_latest_by_from_date(&self.pool, tenant, iqama_no)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No employee config for {}/{}", tenant, iqama_no))
            })?;

        let existing = self
            .attendance
            .list_months_for_employee(&self.pool, tenant, iqama_no)
            .await?;

        Ok(compute_pending_months(
            config.joining_date,
            config.resignation_date,
            MonthLabel::current(),
            &existing,
        ))
    }

    /// Backfill every pending month with full attendance.
    pub async fn create_for_pending_months(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let pending = self.pending_months(company_id, iqama_no).await?;

        let mut created = Vec::with_capacity(pending.len());
        for month in pending {
            let record = self
                .create_attendance(
                    company_id,
                    CreateAttendanceInput {
                        iqama_no: iqama_no.to_string(),
                        month_year: month.to_string(),
                        days_present: month.days_in_month() as i32,
                        remarks: Some("Auto-filled attendance".to_string()),
                    },
                )
                .await?;
            created.push(record);
        }

        Ok(created)
    }

    /// Record the current month, backfilling any earlier gaps first so the
    /// ledger never skips a month.
    pub async fn create_for_current_month(
        &self,
        company_id: &str,
        iqama_no: &str,
        days_present: Option<i32>,
        remarks: Option<String>,
    ) -> Result<AttendanceRecord, AppError> {
        let current = MonthLabel::current();

        let pending = self.pending_months(company_id, iqama_no).await?;
        if !pending.is_empty() {
            log::info!(
                "Backfilling {} pending attendance month(s) for {}/{}",
                pending.len(),
                company_id,
                iqama_no
            );
            self.create_for_pending_months(company_id, iqama_no).await?;
        }

        self.create_attendance(
            company_id,
            CreateAttendanceInput {
                iqama_no: iqama_no.to_string(),
                month_year: current.to_string(),
                days_present: days_present.unwrap_or(current.days_in_month() as i32),
                remarks,
            },
        )
        .await
    }

    /// Create full attendance for all (or the selected) active employees,
    /// collecting per-employee failures instead of aborting the run.
    pub async fn bulk_create(
        &self,
        company_id: &str,
        month_year: &str,
        iqama_nos: Option<Vec<String>>,
    ) -> Result<BulkAttendanceReport, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        let targets = match iqama_nos {
            Some(list) => list,
            None => self
                .configs
                .find_active_roster(tenant, month.last_day())
                .await?
                .into_iter()
                .map(|config| config.iqama_no)
                .collect(),
        };

        let mut results = Vec::with_capacity(targets.len());
        for iqama_no in targets {
            let outcome = self
                .create_attendance(
                    tenant,
                    CreateAttendanceInput {
                        iqama_no: iqama_no.clone(),
                        month_year: month.to_string(),
                        days_present: month.days_in_month() as i32,
                        remarks: Some("Bulk auto attendance".to_string()),
                    },
                )
                .await;

            results.push(match outcome {
                Ok(record) => BulkAttendanceItem {
                    iqama_no,
                    success: true,
                    attendance: Some(record),
                    error: None,
                },
                Err(err) => {
                    log::warn!(
                        "Bulk attendance failed for {}/{} in {}: {}",
                        tenant,
                        iqama_no,
                        month,
                        err
                    );
                    BulkAttendanceItem {
                        iqama_no,
                        success: false,
                        attendance: None,
                        error: Some(err.to_string()),
                    }
                }
            });
        }

        let success_count = results.iter().filter(|item| item.success).count();
        Ok(BulkAttendanceReport {
            month_year: month.to_string(),
            total_employees: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            results,
        })
    }

    async fn config_for_month(
        &self,
        tenant: &str,
        iqama_no: &str,
        month: MonthLabel,
    ) -> Result<Option<EmployeeConfig>, AppError> {
        let config = self
            .configs
            .find_overlapping(&self.pool, tenant, iqama_no, month.first_day(), month.last_day())
            .await?;
        Ok(config)
    }
}

fn check_days_present(days_present: i32, total_working_days: i32) -> Result<(), AppError> {
    if days_present < 0 || days_present > total_working_days {
        return Err(AppError::validation(format!(
            "daysPresent must be between 0 and {}, got {}",
            total_working_days, days_present
        )));
    }
    Ok(())
}

/// Attendance may only cover months inside the employment window.
fn check_employment_window(config: &EmployeeConfig, month: MonthLabel) -> Result<(), AppError> {
    let joining_month = MonthLabel::from_date(config.joining_date);
    if month < joining_month {
        return Err(AppError::validation(format!(
            "{} precedes the joining month {}",
            month, joining_month
        )));
    }

    if let Some(resignation_date) = config.resignation_date {
        let resignation_month = MonthLabel::from_date(resignation_date);
        if month > resignation_month {
            return Err(AppError::validation(format!(
                "{} is after the resignation month {}",
                month, resignation_month
            )));
        }
    }

    Ok(())
}

/// Joining month through min(resignation month, previous month), minus the
/// months already recorded.
fn compute_pending_months(
    joining_date: NaiveDate,
    resignation_date: Option<NaiveDate>,
    current: MonthLabel,
    existing: &[String],
) -> Vec<MonthLabel> {
    let start = MonthLabel::from_date(joining_date);
    let mut end = current.prev();
    if let Some(resignation_date) = resignation_date {
        let resignation_month = MonthLabel::from_date(resignation_date);
        if resignation_month < end {
            end = resignation_month;
        }
    }

    if end < start {
        return Vec::new();
    }

    MonthLabel::months_between(start, end)
        .into_iter()
        .filter(|month| !existing.iter().any(|label| label == &month.to_string()))
        .collect()
}

fn sort_by_month_desc<T>(records: &mut [T], month_of: impl Fn(&T) -> &str) {
    records.sort_by(|a, b| {
        let left = MonthLabel::parse(month_of(a)).ok();
        let right = MonthLabel::parse(month_of(b)).ok();
        right.cmp(&left)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn pending_months_run_from_joining_to_previous_month() {
        // Scenario: joined June 2024, no attendance yet, clock at March 2025
        let months = compute_pending_months(
            date(2024, 6, 15),
            None,
            MonthLabel::new(2025, 3).unwrap(),
            &[],
        );

        assert_eq!(months.len(), 9);
        assert_eq!(months.first().unwrap().to_string(), "June-2024");
        assert_eq!(months.last().unwrap().to_string(), "February-2025");
    }

    #[test]
    fn recorded_months_are_excluded() {
        let months = compute_pending_months(
            date(2025, 1, 1),
            None,
            MonthLabel::new(2025, 4).unwrap(),
            &["January-2025".to_string(), "March-2025".to_string()],
        );

        assert_eq!(months, vec![MonthLabel::new(2025, 2).unwrap()]);
    }

    #[test]
    fn resignation_caps_the_pending_range() {
        let months = compute_pending_months(
            date(2025, 1, 1),
            Some(date(2025, 2, 10)),
            MonthLabel::new(2025, 6).unwrap(),
            &[],
        );

        assert_eq!(months.len(), 2);
        assert_eq!(months.last().unwrap().to_string(), "February-2025");
    }

    #[test]
    fn no_pending_months_for_a_brand_new_hire() {
        let months = compute_pending_months(
            date(2025, 6, 1),
            None,
            MonthLabel::new(2025, 6).unwrap(),
            &[],
        );
        assert!(months.is_empty());
    }

    #[test]
    fn days_present_bounds_are_inclusive() {
        assert!(check_days_present(0, 30).is_ok());
        assert!(check_days_present(30, 30).is_ok());
        assert!(check_days_present(-1, 30).is_err());
        assert!(check_days_present(31, 30).is_err());
    }

    #[test]
    fn employment_window_blocks_out_of_range_months() {
        let mut config = EmployeeConfig::test_stub("bluebinaries", "1234567890");
        config.joining_date = date(2025, 2, 15);
        config.resignation_date = Some(date(2025, 5, 10));

        assert!(check_employment_window(&config, MonthLabel::new(2025, 1).unwrap()).is_err());
        assert!(check_employment_window(&config, MonthLabel::new(2025, 2).unwrap()).is_ok());
        assert!(check_employment_window(&config, MonthLabel::new(2025, 5).unwrap()).is_ok());
        assert!(check_employment_window(&config, MonthLabel::new(2025, 6).unwrap()).is_err());
    }

    #[test]
    fn month_sort_is_newest_first() {
        let mut labels = vec![
            "January-2025".to_string(),
            "December-2024".to_string(),
            "March-2025".to_string(),
        ];
        sort_by_month_desc(&mut labels, |label| label.as_str());
        assert_eq!(labels, vec!["March-2025", "January-2025", "December-2024"]);
    }
}
