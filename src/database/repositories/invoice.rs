use chrono::Utc;
use sqlx::{PgExecutor, PgPool, types::Json};
use uuid::Uuid;

use crate::database::{
    models::{Invoice, NewInvoice},
    utils::sql,
};

const COLUMNS: &str = "id, company_id, invoice_no, iqama_no, employee_name, designation, \
     month_year, version, is_final, total_working_days, days_present, proration_ratio, basic, \
     housing, transport, prorate_service_charge, medical_insurance, iqama_renewal_cost, gosi, \
     fix, saudization, service_charge, exit_fee, exit_reentry_fee, extra_components, \
     gross_earnings, total_deductions, net_payable, remarks, generated_at, replaced_at, \
     finalized_at, created_at, updated_at";

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<Option<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&sql(&format!(
            "SELECT {COLUMNS} FROM invoices WHERE company_id = ? AND iqama_no = ? AND month_year = ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .bind(month_year)
        .fetch_optional(executor)
        .await
    }

    pub async fn insert(
        &self,
        executor: impl PgExecutor<'_>,
        input: &NewInvoice,
    ) -> Result<Invoice, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, Invoice>(&sql(&format!(
            r#"
            INSERT INTO
                invoices (
                    company_id, invoice_no, iqama_no, employee_name, designation,
                    month_year, version, is_final,
                    total_working_days, days_present, proration_ratio,
                    basic, housing, transport, prorate_service_charge,
                    medical_insurance, iqama_renewal_cost, gosi, fix, saudization,
                    service_charge, exit_fee, exit_reentry_fee,
                    extra_components, gross_earnings, total_deductions, net_payable,
                    remarks, generated_at, replaced_at, finalized_at,
                    created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        )))
        .bind(&input.company_id)
        .bind(&input.invoice_no)
        .bind(&input.iqama_no)
        .bind(&input.employee_name)
        .bind(&input.designation)
        .bind(&input.month_year)
        .bind(input.version)
        .bind(input.is_final)
        .bind(input.attendance_snapshot.total_working_days)
        .bind(input.attendance_snapshot.days_present)
        .bind(input.attendance_snapshot.proration_ratio)
        .bind(input.base_salary.basic)
        .bind(input.base_salary.housing)
        .bind(input.base_salary.transport)
        .bind(input.base_salary.prorate_service_charge)
        .bind(input.fixed_costs.medical_insurance)
        .bind(input.fixed_costs.iqama_renewal_cost)
        .bind(input.fixed_costs.gosi)
        .bind(input.fixed_costs.fix)
        .bind(input.fixed_costs.saudization)
        .bind(input.fixed_costs.service_charge)
        .bind(input.fixed_costs.exit_fee)
        .bind(input.fixed_costs.exit_reentry_fee)
        .bind(Json(&input.extra_components))
        .bind(input.gross_earnings)
        .bind(input.total_deductions)
        .bind(input.net_payable)
        .bind(&input.remarks)
        .bind(input.generated_at)
        .bind(input.replaced_at)
        .bind(input.finalized_at)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    /// Replace an existing invoice document in place. The row id and
    /// created_at survive; everything computed is overwritten.
    pub async fn replace(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
        input: &NewInvoice,
    ) -> Result<Invoice, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&sql(&format!(
            r#"
            UPDATE invoices
            SET
                invoice_no = ?, employee_name = ?, designation = ?,
                version = ?, is_final = ?,
                total_working_days = ?, days_present = ?, proration_ratio = ?,
                basic = ?, housing = ?, transport = ?, prorate_service_charge = ?,
                medical_insurance = ?, iqama_renewal_cost = ?, gosi = ?, fix = ?,
                saudization = ?, service_charge = ?, exit_fee = ?, exit_reentry_fee = ?,
                extra_components = ?, gross_earnings = ?, total_deductions = ?,
                net_payable = ?, remarks = ?, generated_at = ?, replaced_at = ?,
                finalized_at = ?, updated_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        )))
        .bind(&input.invoice_no)
        .bind(&input.employee_name)
        .bind(&input.designation)
        .bind(input.version)
        .bind(input.is_final)
        .bind(input.attendance_snapshot.total_working_days)
        .bind(input.attendance_snapshot.days_present)
        .bind(input.attendance_snapshot.proration_ratio)
        .bind(input.base_salary.basic)
        .bind(input.base_salary.housing)
        .bind(input.base_salary.transport)
        .bind(input.base_salary.prorate_service_charge)
        .bind(input.fixed_costs.medical_insurance)
        .bind(input.fixed_costs.iqama_renewal_cost)
        .bind(input.fixed_costs.gosi)
        .bind(input.fixed_costs.fix)
        .bind(input.fixed_costs.saudization)
        .bind(input.fixed_costs.service_charge)
        .bind(input.fixed_costs.exit_fee)
        .bind(input.fixed_costs.exit_reentry_fee)
        .bind(Json(&input.extra_components))
        .bind(input.gross_earnings)
        .bind(input.total_deductions)
        .bind(input.net_payable)
        .bind(&input.remarks)
        .bind(input.generated_at)
        .bind(input.replaced_at)
        .bind(input.finalized_at)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Distinct month labels that still have at least one unfinalized
    /// invoice for the tenant.
    pub async fn distinct_unfinalized_months(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT month_year FROM invoices WHERE company_id = $1 AND is_final = FALSE",
        )
        .bind(company_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(|(month,)| month).collect())
    }

    /// Mark every unfinalized invoice in the given months as final.
    pub async fn finalize_months(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        months: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET is_final = TRUE, finalized_at = $1, updated_at = $1
            WHERE company_id = $2 AND is_final = FALSE AND month_year = ANY($3)
            "#,
        )
        .bind(Utc::now())
        .bind(company_id)
        .bind(months)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_all(&self, company_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM invoices WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn count_final(&self, company_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM invoices WHERE company_id = $1 AND is_final = TRUE",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn distinct_months(&self, company_id: &str) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT month_year FROM invoices WHERE company_id = $1")
                .bind(company_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(month,)| month).collect())
    }

    pub async fn count_for_month(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM invoices WHERE company_id = $1 AND month_year = $2",
        )
        .bind(company_id)
        .bind(month_year)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn find_for_month(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&sql(&format!(
            "SELECT {COLUMNS} FROM invoices WHERE company_id = ? AND month_year = ? ORDER BY employee_name"
        )))
        .bind(company_id)
        .bind(month_year)
        .fetch_all(&self.pool)
        .await
    }

    /// Every invoice for one employee. Sorted chronologically by the caller
    /// since month labels are not lexicographic.
    pub async fn find_all_for_employee(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(&sql(&format!(
            "SELECT {COLUMNS} FROM invoices WHERE company_id = ? AND iqama_no = ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(
        &self,
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
