use crate::database::models::{
    BaseSalarySnapshot, ComponentType, CreateEmployeeConfigInput, EmployeeConfig,
    FixedCostSnapshot, InvoiceComponent, InvoiceTotals,
};
use crate::domain::proration::round2;
use crate::error::AppError;

/// Tenant compensation policy. Each known tenant code resolves to one
/// variant; the variant owns required-field validation, the prorated salary
/// snapshot, and the gross/net formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyPolicy {
    /// Full-breakdown policy: prorated basic/housing/transport plus fixed
    /// costs carried as additive earnings.
    BlueBinaries,
    /// Service-charge-only policy: the prorated service charge is the whole
    /// earning; every other bucket is zeroed.
    Neosoft,
}

impl CompanyPolicy {
    /// Case-insensitive lookup of a tenant code. Unknown codes return `None`;
    /// config creation must treat that as a validation failure.
    pub fn resolve(company_id: &str) -> Option<CompanyPolicy> {
        match company_id.to_lowercase().as_str() {
            "bluebinaries" => Some(CompanyPolicy::BlueBinaries),
            "neosoft" => Some(CompanyPolicy::Neosoft),
            _ => None,
        }
    }

    /// Compute-path resolution: unknown tenants fall back to the
    /// full-breakdown formula, which is the legacy default branch.
    pub fn resolve_or_default(company_id: &str) -> CompanyPolicy {
        CompanyPolicy::resolve(company_id).unwrap_or(CompanyPolicy::BlueBinaries)
    }

    pub fn code(&self) -> &'static str {
        match self {
            CompanyPolicy::BlueBinaries => "bluebinaries",
            CompanyPolicy::Neosoft => "neosoft",
        }
    }

    /// Required-field validation for employee-config creation. Returns every
    /// problem found so the caller can report them all at once.
    pub fn validate_config(&self, input: &CreateEmployeeConfigInput) -> Vec<String> {
        let mut errors = Vec::new();

        if input.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if input.iqama_no.trim().is_empty() {
            errors.push("Iqama number is required".to_string());
        }
        if input.joining_date.is_none() {
            errors.push("Joining date is required".to_string());
        }

        match self {
            CompanyPolicy::BlueBinaries => {
                match input.basic {
                    Some(basic) if basic > 0.0 => {}
                    _ => errors.push("Basic salary is required and must be positive".to_string()),
                }
                match input.housing {
                    Some(housing) if housing >= 0.0 => {}
                    _ => errors
                        .push("Housing allowance is required and must be non-negative".to_string()),
                }
                match input.transport {
                    Some(transport) if transport >= 0.0 => {}
                    _ => errors.push(
                        "Transport allowance is required and must be non-negative".to_string(),
                    ),
                }
            }
            CompanyPolicy::Neosoft => {
                if input.service_charge.is_none() {
                    errors.push("Service charge is required for Neosoft".to_string());
                }
            }
        }

        errors
    }

    /// Build the prorated base-salary and fixed-cost snapshots for one
    /// invoice. Values are captured amounts, not references to the config.
    pub fn salary_snapshot(
        &self,
        config: &EmployeeConfig,
        proration_ratio: f64,
    ) -> Result<(BaseSalarySnapshot, FixedCostSnapshot), AppError> {
        let (base_salary, fixed_costs) = match self {
            CompanyPolicy::Neosoft => {
                let prorated_charge = round2(config.service_charge * proration_ratio);
                (
                    BaseSalarySnapshot {
                        basic: 0.0,
                        housing: 0.0,
                        transport: 0.0,
                        prorate_service_charge: prorated_charge,
                    },
                    FixedCostSnapshot {
                        medical_insurance: 0.0,
                        iqama_renewal_cost: 0.0,
                        gosi: 0.0,
                        fix: 0.0,
                        saudization: 0.0,
                        service_charge: prorated_charge,
                        exit_fee: 0.0,
                        exit_reentry_fee: 0.0,
                    },
                )
            }
            CompanyPolicy::BlueBinaries => (
                BaseSalarySnapshot {
                    basic: round2(config.basic * proration_ratio),
                    housing: round2(config.housing * proration_ratio),
                    transport: round2(config.transport * proration_ratio),
                    prorate_service_charge: 0.0,
                },
                FixedCostSnapshot {
                    medical_insurance: config.medical_insurance,
                    iqama_renewal_cost: config.iqama_renewal_cost,
                    gosi: config.gosi,
                    fix: config.fix,
                    saudization: config.saudization,
                    service_charge: config.service_charge,
                    exit_fee: config.exit_fee,
                    exit_reentry_fee: config.exit_reentry_fee,
                },
            ),
        };

        if base_salary.has_nan() || fixed_costs.has_nan() {
            return Err(AppError::Calculation(format!(
                "Invalid salary snapshot for {} (prorationRatio={}): basic={}, housing={}, transport={}, prorateServiceCharge={}",
                config.iqama_no,
                proration_ratio,
                base_salary.basic,
                base_salary.housing,
                base_salary.transport,
                base_salary.prorate_service_charge,
            )));
        }

        Ok((base_salary, fixed_costs))
    }

    /// Gross/net computation. Fixed costs contribute to gross as additive
    /// earnings under the full-breakdown policy and are never netted; only
    /// ad hoc deduction components reduce the payable amount.
    pub fn compute_totals(
        &self,
        base_salary: &BaseSalarySnapshot,
        fixed_costs: &FixedCostSnapshot,
        extra_components: &[InvoiceComponent],
    ) -> Result<InvoiceTotals, AppError> {
        let extra_earnings: f64 = extra_components
            .iter()
            .filter(|c| c.component_type == ComponentType::Earning)
            .map(|c| c.amount)
            .sum();

        let extra_deductions: f64 = extra_components
            .iter()
            .filter(|c| c.component_type == ComponentType::Deduction)
            .map(|c| c.amount)
            .sum();

        let gross_earnings = match self {
            CompanyPolicy::Neosoft => base_salary.prorate_service_charge + extra_earnings,
            CompanyPolicy::BlueBinaries => {
                base_salary.basic
                    + base_salary.housing
                    + base_salary.transport
                    + base_salary.prorate_service_charge
                    + fixed_costs.total()
                    + extra_earnings
            }
        };

        let total_deductions = extra_deductions;
        let net_payable = gross_earnings - total_deductions;

        if gross_earnings.is_nan() || total_deductions.is_nan() || net_payable.is_nan() {
            return Err(AppError::Calculation(format!(
                "Invalid totals: grossEarnings={}, totalDeductions={}, netPayable={}",
                gross_earnings, total_deductions, net_payable
            )));
        }

        Ok(InvoiceTotals {
            gross_earnings: round2(gross_earnings),
            total_deductions: round2(total_deductions),
            net_payable: round2(net_payable),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn component(kind: ComponentType, amount: f64) -> InvoiceComponent {
        InvoiceComponent {
            key: "adj".to_string(),
            label: "Adjustment".to_string(),
            component_type: kind,
            amount,
        }
    }

    fn bluebinaries_config() -> EmployeeConfig {
        let mut config = EmployeeConfig::test_stub("bluebinaries", "1234567890");
        config.basic = 3000.0;
        config.housing = 1000.0;
        config.transport = 500.0;
        config
    }

    #[test]
    fn resolves_tenant_codes_case_insensitively() {
        assert_eq!(
            CompanyPolicy::resolve("BlueBinaries"),
            Some(CompanyPolicy::BlueBinaries)
        );
        assert_eq!(CompanyPolicy::resolve("NEOSOFT"), Some(CompanyPolicy::Neosoft));
        assert_eq!(CompanyPolicy::resolve("acme"), None);
        assert_eq!(
            CompanyPolicy::resolve_or_default("acme"),
            CompanyPolicy::BlueBinaries
        );
    }

    #[test]
    fn bluebinaries_prorates_base_buckets() {
        // February 2025: 28 days, 20 present -> ratio 0.7143
        let config = bluebinaries_config();
        let (base, fixed) = CompanyPolicy::BlueBinaries
            .salary_snapshot(&config, 0.7143)
            .unwrap();

        assert_eq!(base.basic, 2142.9);
        assert_eq!(base.housing, 714.3);
        assert_eq!(base.transport, 357.15);
        assert_eq!(base.prorate_service_charge, 0.0);
        // Fixed buckets pass through unscaled
        assert_eq!(fixed.service_charge, config.service_charge);
    }

    #[test]
    fn neosoft_snapshot_zeroes_everything_but_service_charge() {
        let mut config = EmployeeConfig::test_stub("neosoft", "9998887776");
        config.service_charge = 5000.0;
        config.basic = 3000.0; // should be ignored by the policy

        let (base, fixed) = CompanyPolicy::Neosoft.salary_snapshot(&config, 1.0).unwrap();

        assert_eq!(base.basic, 0.0);
        assert_eq!(base.housing, 0.0);
        assert_eq!(base.transport, 0.0);
        assert_eq!(base.prorate_service_charge, 5000.0);
        assert_eq!(fixed.medical_insurance, 0.0);
        assert_eq!(fixed.service_charge, 5000.0);
    }

    #[test]
    fn neosoft_gross_is_prorated_service_charge_plus_extras() {
        let mut config = EmployeeConfig::test_stub("neosoft", "9998887776");
        config.service_charge = 5000.0;

        let (base, fixed) = CompanyPolicy::Neosoft.salary_snapshot(&config, 0.5).unwrap();
        let totals = CompanyPolicy::Neosoft
            .compute_totals(
                &base,
                &fixed,
                &[
                    component(ComponentType::Earning, 300.0),
                    component(ComponentType::Deduction, 100.0),
                ],
            )
            .unwrap();

        assert_eq!(totals.gross_earnings, 2800.0);
        assert_eq!(totals.total_deductions, 100.0);
        assert_eq!(totals.net_payable, 2700.0);
    }

    #[test]
    fn bluebinaries_keeps_fixed_costs_as_additive_earnings() {
        let mut config = bluebinaries_config();
        config.medical_insurance = 200.0;
        config.gosi = 100.0;
        config.service_charge = 400.0;

        let (base, fixed) = CompanyPolicy::BlueBinaries
            .salary_snapshot(&config, 1.0)
            .unwrap();
        let totals = CompanyPolicy::BlueBinaries
            .compute_totals(&base, &fixed, &[component(ComponentType::Deduction, 50.0)])
            .unwrap();

        // 3000 + 1000 + 500 base, 700 fixed costs added as earnings
        assert_eq!(totals.gross_earnings, 5200.0);
        assert_eq!(totals.total_deductions, 50.0);
        assert_eq!(totals.net_payable, 5150.0);
    }

    #[test]
    fn validation_requirements_differ_per_policy() {
        let mut input = CreateEmployeeConfigInput::test_stub("Ahmed", "1234567890");
        input.basic = Some(3000.0);
        input.housing = Some(1000.0);
        input.transport = Some(500.0);
        assert!(CompanyPolicy::BlueBinaries.validate_config(&input).is_empty());
        // Neosoft wants a service charge instead
        assert_eq!(
            CompanyPolicy::Neosoft.validate_config(&input),
            vec!["Service charge is required for Neosoft".to_string()]
        );

        input.basic = Some(0.0);
        let errors = CompanyPolicy::BlueBinaries.validate_config(&input);
        assert!(errors.contains(&"Basic salary is required and must be positive".to_string()));
    }

    #[test]
    fn nan_inputs_are_rejected_as_calculation_errors() {
        let mut config = bluebinaries_config();
        config.basic = f64::NAN;

        let err = CompanyPolicy::BlueBinaries
            .salary_snapshot(&config, 1.0)
            .unwrap_err();
        assert!(matches!(err, AppError::Calculation(_)));
    }
}
