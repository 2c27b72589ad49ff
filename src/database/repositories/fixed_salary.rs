use chrono::Utc;
use sqlx::PgPool;

use crate::database::{
    models::{FixedSalaryDefaults, UpsertFixedSalaryInput},
    utils::sql,
};

const COLUMNS: &str = "id, company_id, medical_insurance, iqama_renewal_cost, gosi, fix, \
     saudization, service_charge, exit_fee, exit_reentry_fee, created_at, updated_at";

#[derive(Clone)]
pub struct FixedSalaryRepository {
    pool: PgPool,
}

impl FixedSalaryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        company_id: &str,
    ) -> Result<Option<FixedSalaryDefaults>, sqlx::Error> {
        sqlx::query_as::<_, FixedSalaryDefaults>(&sql(&format!(
            "SELECT {COLUMNS} FROM fixed_salary_defaults WHERE company_id = ?"
        )))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Create or fully overwrite the tenant's template in one statement.
    pub async fn upsert(
        &self,
        company_id: &str,
        input: &UpsertFixedSalaryInput,
    ) -> Result<FixedSalaryDefaults, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, FixedSalaryDefaults>(&sql(&format!(
            r#"
            INSERT INTO
                fixed_salary_defaults (
                    company_id, medical_insurance, iqama_renewal_cost, gosi, fix,
                    saudization, service_charge, exit_fee, exit_reentry_fee,
                    created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (company_id) DO UPDATE
            SET
                medical_insurance = EXCLUDED.medical_insurance,
                iqama_renewal_cost = EXCLUDED.iqama_renewal_cost,
                gosi = EXCLUDED.gosi,
                fix = EXCLUDED.fix,
                saudization = EXCLUDED.saudization,
                service_charge = EXCLUDED.service_charge,
                exit_fee = EXCLUDED.exit_fee,
                exit_reentry_fee = EXCLUDED.exit_reentry_fee,
                updated_at = EXCLUDED.updated_at
            RETURNING {COLUMNS}
            "#
        )))
        .bind(company_id)
        .bind(input.medical_insurance)
        .bind(input.iqama_renewal_cost)
        .bind(input.gosi)
        .bind(input.fix)
        .bind(input.saudization)
        .bind(input.service_charge)
        .bind(input.exit_fee)
        .bind(input.exit_reentry_fee)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, company_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fixed_salary_defaults WHERE company_id = $1")
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
