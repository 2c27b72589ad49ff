use chrono::{NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::{
    models::{EmployeeConfig, NewEmployeeConfig, open_ended_date},
    utils::sql,
};

const COLUMNS: &str = "id, company_id, iqama_no, name, designation, status, basic, housing, \
     transport, medical_insurance, iqama_renewal_cost, gosi, fix, saudization, service_charge, \
     exit_fee, exit_reentry_fee, joining_date, resignation_date, from_date, to_date, created_at, \
     updated_at";

#[derive(Clone)]
pub struct EmployeeConfigRepository {
    pool: PgPool,
}

impl EmployeeConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new config period. The composite unique index on
    /// (company_id, iqama_no, to_date) enforces the one-open-period
    /// invariant at the storage level.
    pub async fn insert(
        &self,
        executor: impl PgExecutor<'_>,
        input: &NewEmployeeConfig,
    ) -> Result<EmployeeConfig, sqlx::Error> {
        let now = Utc::now();

        let config = sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            r#"
            INSERT INTO
                employee_configs (
                    company_id, iqama_no, name, designation, status,
                    basic, housing, transport,
                    medical_insurance, iqama_renewal_cost, gosi, fix, saudization,
                    service_charge, exit_fee, exit_reentry_fee,
                    joining_date, resignation_date, from_date, to_date,
                    created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        )))
        .bind(&input.company_id)
        .bind(&input.iqama_no)
        .bind(&input.name)
        .bind(&input.designation)
        .bind(input.status)
        .bind(input.basic)
        .bind(input.housing)
        .bind(input.transport)
        .bind(input.medical_insurance)
        .bind(input.iqama_renewal_cost)
        .bind(input.gosi)
        .bind(input.fix)
        .bind(input.saudization)
        .bind(input.service_charge)
        .bind(input.exit_fee)
        .bind(input.exit_reentry_fee)
        .bind(input.joining_date)
        .bind(input.resignation_date)
        .bind(input.from_date)
        .bind(input.to_date)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(config)
    }

    /// The employee's open-ended (current) period, if any.
    pub async fn find_open_period(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND iqama_no = ? AND to_date = ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .bind(open_ended_date())
        .fetch_optional(executor)
        .await
    }

    pub async fn set_to_date(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
        to_date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE employee_configs SET to_date = $1, updated_at = $2 WHERE id = $3")
            .bind(to_date)
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn find_by_id(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Another period occupying the same (company, iqama, to_date) slot.
    pub async fn find_conflict(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        to_date: NaiveDate,
        exclude_id: Uuid,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND iqama_no = ? AND to_date = ? AND id <> ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .bind(to_date)
        .bind(exclude_id)
        .fetch_optional(executor)
        .await
    }

    /// Full-row update used by in-place corrections.
    pub async fn update_row(
        &self,
        executor: impl PgExecutor<'_>,
        config: &EmployeeConfig,
    ) -> Result<EmployeeConfig, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            r#"
            UPDATE employee_configs
            SET
                iqama_no = ?, name = ?, designation = ?, status = ?,
                basic = ?, housing = ?, transport = ?,
                medical_insurance = ?, iqama_renewal_cost = ?, gosi = ?, fix = ?, saudization = ?,
                service_charge = ?, exit_fee = ?, exit_reentry_fee = ?,
                joining_date = ?, resignation_date = ?, from_date = ?, to_date = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        )))
        .bind(&config.iqama_no)
        .bind(&config.name)
        .bind(&config.designation)
        .bind(config.status)
        .bind(config.basic)
        .bind(config.housing)
        .bind(config.transport)
        .bind(config.medical_insurance)
        .bind(config.iqama_renewal_cost)
        .bind(config.gosi)
        .bind(config.fix)
        .bind(config.saudization)
        .bind(config.service_charge)
        .bind(config.exit_fee)
        .bind(config.exit_reentry_fee)
        .bind(config.joining_date)
        .bind(config.resignation_date)
        .bind(config.from_date)
        .bind(config.to_date)
        .bind(Utc::now())
        .bind(config.id)
        .fetch_one(executor)
        .await
    }

    /// The period whose [from_date, to_date] interval contains `as_of`.
    pub async fn find_active(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        as_of: NaiveDate,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND iqama_no = ? AND from_date <= ? AND to_date >= ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .bind(as_of)
        .bind(as_of)
        .fetch_optional(executor)
        .await
    }

    /// Per employee, the config period overlapping [start, end] with the
    /// latest from_date, so a mid-month correction wins over the period it
    /// superseded.
    pub async fn find_for_period(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            r#"
            SELECT DISTINCT ON (iqama_no) {COLUMNS}
            FROM employee_configs
            WHERE company_id = ? AND from_date <= ? AND to_date >= ?
            ORDER BY iqama_no, from_date DESC
            "#
        )))
        .bind(company_id)
        .bind(end)
        .bind(start)
        .fetch_all(executor)
        .await
    }

    /// The employee's config period overlapping [start, end], preferring the
    /// latest from_date when several do.
    pub async fn find_overlapping(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            r#"
            SELECT {COLUMNS}
            FROM employee_configs
            WHERE company_id = ? AND iqama_no = ? AND from_date <= ? AND to_date >= ?
            ORDER BY from_date DESC
            LIMIT 1
            "#
        )))
        .bind(company_id)
        .bind(iqama_no)
        .bind(end)
        .bind(start)
        .fetch_optional(executor)
        .await
    }

    /// Full period history for one employee, newest first.
    pub async fn find_history(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND iqama_no = ? ORDER BY from_date DESC"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .fetch_all(&self.pool)
        .await
    }

    /// Open-ended configs for every employee of the tenant.
    pub async fn find_all_latest(
        &self,
        company_id: &str,
    ) -> Result<Vec<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND to_date = ? ORDER BY name"
        )))
        .bind(company_id)
        .bind(open_ended_date())
        .fetch_all(&self.pool)
        .await
    }

    /// Employees with an active config covering `as_of` and active status.
    pub async fn find_active_roster(
        &self,
        company_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND status = 'active' AND from_date <= ? AND to_date >= ? ORDER BY name"
        )))
        .bind(company_id)
        .bind(as_of)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
    }

    /// The chronologically latest period by from_date, regardless of
    /// open-endedness. Used to reopen a predecessor after a delete.
    pub async fn find_latest_by_from_date(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Option<EmployeeConfig>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeConfig>(&sql(&format!(
            "SELECT {COLUMNS} FROM employee_configs WHERE company_id = ? AND iqama_no = ? ORDER BY from_date DESC LIMIT 1"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM employee_configs WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
