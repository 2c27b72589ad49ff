pub mod attendance;
pub mod employee_config;
pub mod fixed_salary;
pub mod invoice;

pub use attendance::AttendanceRepository;
pub use employee_config::EmployeeConfigRepository;
pub use fixed_salary::FixedSalaryRepository;
pub use invoice::InvoiceRepository;
