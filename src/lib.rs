pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use services::{AttendanceService, EmployeeConfigService, InvoiceService};

use database::repositories::{
    AttendanceRepository, EmployeeConfigRepository, FixedSalaryRepository, InvoiceRepository,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub employee_configs: EmployeeConfigService,
    pub attendance: AttendanceService,
    pub invoices: InvoiceService,
    pub fixed_salary: FixedSalaryRepository,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config_repository = EmployeeConfigRepository::new(pool.clone());
        let attendance_repository = AttendanceRepository::new(pool.clone());
        let invoice_repository = InvoiceRepository::new(pool.clone());
        let fixed_salary_repository = FixedSalaryRepository::new(pool.clone());

        AppState {
            employee_configs: EmployeeConfigService::new(
                pool.clone(),
                config_repository.clone(),
                fixed_salary_repository.clone(),
            ),
            attendance: AttendanceService::new(
                pool.clone(),
                attendance_repository.clone(),
                config_repository.clone(),
                invoice_repository.clone(),
            ),
            invoices: InvoiceService::new(
                pool,
                invoice_repository,
                attendance_repository,
                config_repository,
            ),
            fixed_salary: fixed_salary_repository,
        }
    }
}
