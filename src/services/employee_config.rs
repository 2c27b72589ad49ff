use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{
        CreateEmployeeConfigInput, EmployeeConfig, EmploymentStatus, FixedSalaryDefaults,
        NewEmployeeConfig, UpdateEmployeeConfigInput, open_ended_date,
    },
    repositories::{EmployeeConfigRepository, FixedSalaryRepository},
};
use crate::domain::{CompanyPolicy, MonthLabel};
use crate::error::AppError;

use super::require_tenant;

/// Timeline of salary configuration periods per (tenant, employee). All
/// mutations that touch more than one period run inside a transaction.
#[derive(Clone)]
pub struct EmployeeConfigService {
    pool: PgPool,
    configs: EmployeeConfigRepository,
    fixed_salary: FixedSalaryRepository,
}

impl EmployeeConfigService {
    pub fn new(
        pool: PgPool,
        configs: EmployeeConfigRepository,
        fixed_salary: FixedSalaryRepository,
    ) -> Self {
        Self {
            pool,
            configs,
            fixed_salary,
        }
    }

    /// Append a new config period. The previous open-ended period, if any,
    /// is closed to the day before the new period starts.
    pub async fn create_config(
        &self,
        company_id: &str,
        input: CreateEmployeeConfigInput,
    ) -> Result<EmployeeConfig, AppError> {
        let tenant = require_tenant(company_id)?;
        let policy = CompanyPolicy::resolve(tenant)
            .ok_or_else(|| AppError::validation(format!("Unknown company: {}", tenant)))?;

        let errors = policy.validate_config(&input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        let defaults = if input.use_default_fixed_salary {
            let defaults = self.fixed_salary.find(tenant).await?.ok_or_else(|| {
                AppError::not_found(format!("No fixed salary defaults configured for {}", tenant))
            })?;
            Some(defaults)
        } else {
            None
        };

        let new_config = normalize_create(
            tenant,
            policy,
            &input,
            defaults.as_ref(),
            Utc::now().date_naive(),
        )?;

        let mut tx = self.pool.begin().await?;

        if let Some(open) = self
            .configs
            .find_open_period(&mut *tx, tenant, &new_config.iqama_no)
            .await?
        {
            let closed_to = close_date_before(new_config.from_date)?;
            self.configs.set_to_date(&mut *tx, open.id, closed_to).await?;
            log::info!(
                "Closed config period {} for {}/{} at {}",
                open.id,
                tenant,
                new_config.iqama_no,
                closed_to
            );
        }

        let created = self.configs.insert(&mut *tx, &new_config).await?;
        tx.commit().await?;

        Ok(created)
    }

    /// In-place correction of one period. Changing `to_date` must not collide
    /// with another period in the same (tenant, employee, to_date) slot.
    pub async fn update_config(
        &self,
        company_id: &str,
        id: Uuid,
        changes: UpdateEmployeeConfigInput,
    ) -> Result<EmployeeConfig, AppError> {
        let tenant = require_tenant(company_id)?;

        let mut tx = self.pool.begin().await?;

        let existing = self
            .configs
            .find_by_id(&mut *tx, id)
            .await?
            .filter(|config| config.company_id == tenant)
            .ok_or_else(|| AppError::not_found(format!("Employee config {} not found", id)))?;

        let updated = apply_update(existing, changes);

        if let Some(conflict) = self
            .configs
            .find_conflict(&mut *tx, tenant, &updated.iqama_no, updated.to_date, id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Config period {} already ends at {}",
                conflict.id, updated.to_date
            )));
        }

        let saved = self.configs.update_row(&mut *tx, &updated).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// Create a fresh period starting on the first day of the month after
    /// the base date, closing the current one at the boundary.
    pub async fn recreate_config(
        &self,
        company_id: &str,
        mut input: CreateEmployeeConfigInput,
    ) -> Result<EmployeeConfig, AppError> {
        let base = input.from_date.unwrap_or_else(|| Utc::now().date_naive());
        input.from_date = Some(MonthLabel::from_date(base).next().first_day());
        self.create_config(company_id, input).await
    }

    pub async fn get_active_config(
        &self,
        company_id: &str,
        iqama_no: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<EmployeeConfig, AppError> {
        let tenant = require_tenant(company_id)?;
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

        self.configs
            .find_active(self.configs.pool(), tenant, iqama_no, as_of)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No active config for {}/{} as of {}",
                    tenant, iqama_no, as_of
                ))
            })
    }

    /// For each employee of the tenant, the config period in effect during
    /// the given month (latest from_date wins).
    pub async fn get_configs_for_period(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<EmployeeConfig>, AppError> {
        let tenant = require_tenant(company_id)?;
        let month = MonthLabel::parse(month_year)?;

        let configs = self
            .configs
            .find_for_period(self.configs.pool(), tenant, month.first_day(), month.last_day())
            .await?;

        Ok(configs)
    }

    /// Remove the open-ended period and reopen its predecessor.
    pub async fn delete_latest_config(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<(), AppError> {
        let tenant = require_tenant(company_id)?;

        let mut tx = self.pool.begin().await?;

        let open = self
            .configs
            .find_open_period(&mut *tx, tenant, iqama_no)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No current config for {}/{}", tenant, iqama_no))
            })?;

        self.configs.delete(&mut *tx, open.id).await?;

        if let Some(previous) = self
            .configs
            .find_latest_by_from_date(&mut *tx, tenant, iqama_no)
            .await?
        {
            self.configs
                .set_to_date(&mut *tx, previous.id, open_ended_date())
                .await?;
            log::info!(
                "Reopened config period {} for {}/{}",
                previous.id,
                tenant,
                iqama_no
            );
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(&self, company_id: &str, id: Uuid) -> Result<EmployeeConfig, AppError> {
        let tenant = require_tenant(company_id)?;

        self.configs
            .find_by_id(self.configs.pool(), id)
            .await?
            .filter(|config| config.company_id == tenant)
            .ok_or_else(|| AppError::not_found(format!("Employee config {} not found", id)))
    }

    pub async fn get_history(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<EmployeeConfig>, AppError> {
        let tenant = require_tenant(company_id)?;
        Ok(self.configs.find_history(tenant, iqama_no).await?)
    }

    /// Open-ended configs for every employee, i.e. the current roster view.
    pub async fn get_all_latest(&self, company_id: &str) -> Result<Vec<EmployeeConfig>, AppError> {
        let tenant = require_tenant(company_id)?;
        Ok(self.configs.find_all_latest(tenant).await?)
    }
}

/// Where the previous open-ended period ends when a new one starts on
/// `from_date`. When both periods start the same day the predecessor is
/// closed to the day before its own start, leaving an empty interval.
fn close_date_before(from_date: NaiveDate) -> Result<NaiveDate, AppError> {
    from_date
        .pred_opt()
        .ok_or_else(|| AppError::validation("fromDate is out of range"))
}

/// Resolve defaults and policy rules into the exact row to insert.
fn normalize_create(
    tenant: &str,
    policy: CompanyPolicy,
    input: &CreateEmployeeConfigInput,
    defaults: Option<&FixedSalaryDefaults>,
    today: NaiveDate,
) -> Result<NewEmployeeConfig, AppError> {
    let joining_date = input
        .joining_date
        .ok_or_else(|| AppError::validation("Joining date is required"))?;
    let from_date = input.from_date.unwrap_or(today);
    let to_date = input.to_date.unwrap_or_else(open_ended_date);

    if to_date < from_date {
        return Err(AppError::validation(format!(
            "toDate {} precedes fromDate {}",
            to_date, from_date
        )));
    }

    let bucket = |value: Option<f64>, default: fn(&FixedSalaryDefaults) -> f64| {
        value.or_else(|| defaults.map(default)).unwrap_or(0.0)
    };

    let mut config = NewEmployeeConfig {
        company_id: tenant.to_string(),
        iqama_no: input.iqama_no.trim().to_string(),
        name: input.name.trim().to_string(),
        designation: input.designation.clone(),
        status: input.status.unwrap_or(EmploymentStatus::Active),
        basic: input.basic.unwrap_or(0.0),
        housing: input.housing.unwrap_or(0.0),
        transport: input.transport.unwrap_or(0.0),
        medical_insurance: bucket(input.medical_insurance, |d| d.medical_insurance),
        iqama_renewal_cost: bucket(input.iqama_renewal_cost, |d| d.iqama_renewal_cost),
        gosi: bucket(input.gosi, |d| d.gosi),
        fix: bucket(input.fix, |d| d.fix),
        saudization: bucket(input.saudization, |d| d.saudization),
        service_charge: bucket(input.service_charge, |d| d.service_charge),
        exit_fee: bucket(input.exit_fee, |d| d.exit_fee),
        exit_reentry_fee: bucket(input.exit_reentry_fee, |d| d.exit_reentry_fee),
        joining_date,
        resignation_date: input.resignation_date,
        from_date,
        to_date,
    };

    if policy == CompanyPolicy::Neosoft {
        // Service charge is the only compensated bucket under this policy.
        config.basic = 0.0;
        config.housing = 0.0;
        config.transport = 0.0;
        config.medical_insurance = 0.0;
        config.iqama_renewal_cost = 0.0;
        config.gosi = 0.0;
        config.fix = 0.0;
        config.saudization = 0.0;
        config.exit_fee = 0.0;
        config.exit_reentry_fee = 0.0;
    }

    Ok(config)
}

/// Merge a partial update into an existing period.
fn apply_update(mut config: EmployeeConfig, changes: UpdateEmployeeConfigInput) -> EmployeeConfig {
    if let Some(iqama_no) = changes.iqama_no {
        config.iqama_no = iqama_no;
    }
    if let Some(name) = changes.name {
        config.name = name;
    }
    if changes.designation.is_some() {
        config.designation = changes.designation;
    }
    if let Some(status) = changes.status {
        config.status = status;
    }
    if let Some(basic) = changes.basic {
        config.basic = basic;
    }
    if let Some(housing) = changes.housing {
        config.housing = housing;
    }
    if let Some(transport) = changes.transport {
        config.transport = transport;
    }
    if let Some(medical_insurance) = changes.medical_insurance {
        config.medical_insurance = medical_insurance;
    }
    if let Some(iqama_renewal_cost) = changes.iqama_renewal_cost {
        config.iqama_renewal_cost = iqama_renewal_cost;
    }
    if let Some(gosi) = changes.gosi {
        config.gosi = gosi;
    }
    if let Some(fix) = changes.fix {
        config.fix = fix;
    }
    if let Some(saudization) = changes.saudization {
        config.saudization = saudization;
    }
    if let Some(service_charge) = changes.service_charge {
        config.service_charge = service_charge;
    }
    if let Some(exit_fee) = changes.exit_fee {
        config.exit_fee = exit_fee;
    }
    if let Some(exit_reentry_fee) = changes.exit_reentry_fee {
        config.exit_reentry_fee = exit_reentry_fee;
    }
    if let Some(joining_date) = changes.joining_date {
        config.joining_date = joining_date;
    }
    if changes.resignation_date.is_some() {
        config.resignation_date = changes.resignation_date;
    }
    if let Some(from_date) = changes.from_date {
        config.from_date = from_date;
    }
    if let Some(to_date) = changes.to_date {
        config.to_date = to_date;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bluebinaries_input() -> CreateEmployeeConfigInput {
        let mut input = CreateEmployeeConfigInput::test_stub("Ahmed", "1234567890");
        input.basic = Some(3000.0);
        input.housing = Some(1000.0);
        input.transport = Some(500.0);
        input
    }

    fn defaults() -> FixedSalaryDefaults {
        FixedSalaryDefaults {
            id: Uuid::new_v4(),
            company_id: "bluebinaries".to_string(),
            medical_insurance: 150.0,
            iqama_renewal_cost: 54.17,
            gosi: 100.0,
            fix: 75.0,
            saudization: 33.33,
            service_charge: 400.0,
            exit_fee: 0.0,
            exit_reentry_fee: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn dates_default_to_today_and_open_ended() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let config = normalize_create(
            "bluebinaries",
            CompanyPolicy::BlueBinaries,
            &bluebinaries_input(),
            None,
            today,
        )
        .unwrap();

        assert_eq!(config.from_date, today);
        assert_eq!(config.to_date, open_ended_date());
        assert_eq!(config.status, EmploymentStatus::Active);
    }

    #[test]
    fn explicit_buckets_win_over_defaults() {
        let mut input = bluebinaries_input();
        input.gosi = Some(120.0);

        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let config = normalize_create(
            "bluebinaries",
            CompanyPolicy::BlueBinaries,
            &input,
            Some(&defaults()),
            today,
        )
        .unwrap();

        assert_eq!(config.gosi, 120.0);
        assert_eq!(config.medical_insurance, 150.0);
        assert_eq!(config.service_charge, 400.0);
    }

    #[test]
    fn neosoft_keeps_only_the_service_charge() {
        let mut input = CreateEmployeeConfigInput::test_stub("Priya", "9998887776");
        input.service_charge = Some(5000.0);
        input.basic = Some(3000.0);
        input.medical_insurance = Some(200.0);

        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let config =
            normalize_create("neosoft", CompanyPolicy::Neosoft, &input, None, today).unwrap();

        assert_eq!(config.service_charge, 5000.0);
        assert_eq!(config.basic, 0.0);
        assert_eq!(config.medical_insurance, 0.0);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let mut input = bluebinaries_input();
        input.from_date = NaiveDate::from_ymd_opt(2025, 6, 10);
        input.to_date = NaiveDate::from_ymd_opt(2025, 6, 1);

        let err = normalize_create(
            "bluebinaries",
            CompanyPolicy::BlueBinaries,
            &input,
            None,
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn replacement_starting_same_day_closes_predecessor_to_day_before() {
        // A period opened on 2025-06-10 and replaced by another starting
        // 2025-06-10 ends the day before it began; the empty interval is
        // kept rather than rejected.
        let open_from = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let closed_to = close_date_before(open_from).unwrap();
        assert_eq!(closed_to, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        assert!(closed_to < open_from);
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let config = EmployeeConfig::test_stub("bluebinaries", "1234567890");
        let original_basic = config.basic;

        let changes = UpdateEmployeeConfigInput {
            iqama_no: None,
            name: Some("Renamed".to_string()),
            designation: None,
            status: None,
            basic: None,
            housing: Some(1200.0),
            transport: None,
            medical_insurance: None,
            iqama_renewal_cost: None,
            gosi: None,
            fix: None,
            saudization: None,
            service_charge: None,
            exit_fee: None,
            exit_reentry_fee: None,
            joining_date: None,
            resignation_date: None,
            from_date: None,
            to_date: None,
        };

        let updated = apply_update(config, changes);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.housing, 1200.0);
        assert_eq!(updated.basic, original_basic);
    }
}
