pub mod attendance;
pub mod employee_config;
pub mod fixed_salary;
pub mod invoice;
pub(crate) mod macros;

// Re-export all models for easy importing
pub use attendance::*;
pub use employee_config::*;
pub use fixed_salary::*;
pub use invoice::*;
