pub mod attendance;
pub mod employee_config;
pub mod fixed_salary;
pub mod invoice;
pub mod shared;
