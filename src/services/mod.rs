pub mod attendance;
pub mod employee_config;
pub mod invoice;

pub use attendance::AttendanceService;
pub use employee_config::EmployeeConfigService;
pub use invoice::InvoiceService;

use crate::error::AppError;

/// Every operation is tenant-scoped; a blank tenant code is caller error.
pub(crate) fn require_tenant(company_id: &str) -> Result<&str, AppError> {
    let trimmed = company_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Company id is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tenant_is_rejected() {
        assert!(require_tenant("").is_err());
        assert!(require_tenant("   ").is_err());
        assert_eq!(require_tenant(" bluebinaries ").unwrap(), "bluebinaries");
    }
}
