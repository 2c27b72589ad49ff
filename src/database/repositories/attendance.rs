use chrono::Utc;
use sqlx::{PgExecutor, PgPool};

use crate::database::{
    models::{AttendanceRecord, NewAttendance},
    utils::sql,
};

const COLUMNS: &str = "id, company_id, iqama_no, name, month_year, total_working_days, \
     days_present, remarks, created_at, updated_at";

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&sql(&format!(
            "SELECT {COLUMNS} FROM attendance WHERE company_id = ? AND iqama_no = ? AND month_year = ?"
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
        input: &NewAttendance,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, AttendanceRecord>(&sql(&format!(
            r#"
            INSERT INTO
                attendance (
                    company_id, iqama_no, name, month_year,
                    total_working_days, days_present, remarks,
                    created_at, updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        )))
        .bind(&input.company_id)
        .bind(&input.iqama_no)
        .bind(&input.name)
        .bind(&input.month_year)
        .bind(input.total_working_days)
        .bind(input.days_present)
        .bind(&input.remarks)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    /// Overwrite the mutable fields of an existing record. The name snapshot
    /// and identity columns stay as they were.
    pub async fn update_in_place(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
        total_working_days: i32,
        days_present: i32,
        remarks: Option<&str>,
    ) -> Result<AttendanceRecord, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&sql(&format!(
            r#"
            UPDATE attendance
            SET total_working_days = ?, days_present = ?, remarks = ?, updated_at = ?
            WHERE company_id = ? AND iqama_no = ? AND month_year = ?
            RETURNING {COLUMNS}
            "#
        )))
        .bind(total_working_days)
        .bind(days_present)
        .bind(remarks)
        .bind(Utc::now())
        .bind(company_id)
        .bind(iqama_no)
        .bind(month_year)
        .fetch_one(executor)
        .await
    }

    pub async fn delete(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
        month_year: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM attendance WHERE company_id = $1 AND iqama_no = $2 AND month_year = $3",
        )
        .bind(company_id)
        .bind(iqama_no)
        .bind(month_year)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Every record for one month of the tenant, ordered by employee name.
    pub async fn find_for_month(
        &self,
        company_id: &str,
        month_year: &str,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&sql(&format!(
            "SELECT {COLUMNS} FROM attendance WHERE company_id = ? AND month_year = ? ORDER BY name"
        )))
        .bind(company_id)
        .bind(month_year)
        .fetch_all(&self.pool)
        .await
    }

    /// Every record for one employee. Chronological ordering happens in the
    /// service layer because month labels do not sort lexicographically.
    pub async fn find_all_for_employee(
        &self,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(&sql(&format!(
            "SELECT {COLUMNS} FROM attendance WHERE company_id = ? AND iqama_no = ?"
        )))
        .bind(company_id)
        .bind(iqama_no)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_months_for_employee(
        &self,
        executor: impl PgExecutor<'_>,
        company_id: &str,
        iqama_no: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT month_year FROM attendance WHERE company_id = $1 AND iqama_no = $2",
        )
        .bind(company_id)
        .bind(iqama_no)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(|(month,)| month).collect())
    }
}
