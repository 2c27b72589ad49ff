//! End-to-end checks over the pure payroll pipeline: month arithmetic,
//! proration, and per-tenant policy math, exercised the way the invoice
//! engine drives them.

use chrono::NaiveDate;
use payroll_be::database::models::{
    ComponentType, EmployeeConfig, InvoiceComponent, open_ended_date,
};
use payroll_be::domain::proration::{calculate_proration_ratio, round2};
use payroll_be::domain::{CompanyPolicy, MonthLabel};
use payroll_be::error::AppError;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn config(company_id: &str, iqama_no: &str) -> EmployeeConfig {
    EmployeeConfig {
        id: Uuid::new_v4(),
        company_id: company_id.to_string(),
        iqama_no: iqama_no.to_string(),
        name: "Test Employee".to_string(),
        designation: Some("Technician".to_string()),
        status: payroll_be::database::models::EmploymentStatus::Active,
        basic: 0.0,
        housing: 0.0,
        transport: 0.0,
        medical_insurance: 0.0,
        iqama_renewal_cost: 0.0,
        gosi: 0.0,
        fix: 0.0,
        saudization: 0.0,
        service_charge: 0.0,
        exit_fee: 0.0,
        exit_reentry_fee: 0.0,
        joining_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        resignation_date: None,
        from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        to_date: open_ended_date(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[test]
fn partial_february_attendance_prorates_the_full_breakdown() {
    // bluebinaries employee, basic=3000/housing=1000/transport=500,
    // 20 of 28 days present in February 2025
    let mut employee = config("bluebinaries", "1234567890");
    employee.basic = 3000.0;
    employee.housing = 1000.0;
    employee.transport = 500.0;

    let month = MonthLabel::parse("February-2025").unwrap();
    assert_eq!(month.days_in_month(), 28);

    let ratio = calculate_proration_ratio(month.days_in_month() as i32, 20).unwrap();
    assert_eq!(ratio, 0.7143);

    let policy = CompanyPolicy::resolve_or_default("bluebinaries");
    let (base, fixed) = policy.salary_snapshot(&employee, ratio).unwrap();
    assert_eq!(base.basic, 2142.9);
    assert_eq!(base.housing, 714.3);
    assert_eq!(base.transport, 357.15);

    let totals = policy.compute_totals(&base, &fixed, &[]).unwrap();
    assert_eq!(totals.gross_earnings, round2(2142.9 + 714.3 + 357.15));
    assert_eq!(totals.total_deductions, 0.0);
    assert_eq!(totals.net_payable, totals.gross_earnings);
}

#[test]
fn service_charge_tenant_earns_only_the_prorated_charge() {
    let mut employee = config("neosoft", "9998887776");
    employee.service_charge = 5000.0;
    // Buckets that should be ignored by the policy even if set
    employee.basic = 3000.0;
    employee.medical_insurance = 150.0;

    let ratio = calculate_proration_ratio(30, 30).unwrap();
    assert_eq!(ratio, 1.0);

    let policy = CompanyPolicy::resolve_or_default("neosoft");
    let (base, fixed) = policy.salary_snapshot(&employee, ratio).unwrap();
    let totals = policy.compute_totals(&base, &fixed, &[]).unwrap();

    assert_eq!(base.basic, 0.0);
    assert_eq!(base.housing, 0.0);
    assert_eq!(base.transport, 0.0);
    assert_eq!(totals.gross_earnings, 5000.0);
    assert_eq!(totals.net_payable, 5000.0);
}

#[test]
fn fixed_costs_raise_gross_but_never_the_deductions() {
    let mut employee = config("bluebinaries", "1234567890");
    employee.basic = 3000.0;
    employee.housing = 1000.0;
    employee.transport = 500.0;
    employee.medical_insurance = 150.0;
    employee.gosi = 100.0;
    employee.service_charge = 400.0;

    let policy = CompanyPolicy::resolve_or_default("bluebinaries");
    let (base, fixed) = policy.salary_snapshot(&employee, 1.0).unwrap();

    let extras = vec![
        InvoiceComponent {
            key: "overtime".to_string(),
            label: "Overtime".to_string(),
            component_type: ComponentType::Earning,
            amount: 250.0,
        },
        InvoiceComponent {
            key: "advance".to_string(),
            label: "Salary Advance".to_string(),
            component_type: ComponentType::Deduction,
            amount: 400.0,
        },
    ];
    let totals = policy.compute_totals(&base, &fixed, &extras).unwrap();

    // 4500 base + 650 fixed + 250 extra earnings
    assert_eq!(totals.gross_earnings, 5400.0);
    assert_eq!(totals.total_deductions, 400.0);
    assert_eq!(totals.net_payable, 5000.0);
}

#[test]
fn unknown_tenants_compute_with_the_full_breakdown_formula() {
    let mut employee = config("acme", "0001112223");
    employee.basic = 1000.0;

    let policy = CompanyPolicy::resolve_or_default("acme");
    assert_eq!(policy, CompanyPolicy::BlueBinaries);
    assert_eq!(CompanyPolicy::resolve("acme"), None);

    let (base, _) = policy.salary_snapshot(&employee, 0.5).unwrap();
    assert_eq!(base.basic, 500.0);
}

#[test]
fn out_of_range_attendance_is_an_attendance_error() {
    for (total, present) in [(0, 0), (-1, 0), (28, -1), (28, 29)] {
        let err = calculate_proration_ratio(total, present).unwrap_err();
        assert!(
            matches!(err, AppError::InvalidAttendance(_)),
            "({}, {}) should be rejected",
            total,
            present
        );
    }
}

#[test]
fn a_month_locks_as_soon_as_the_calendar_rolls_past_it() {
    // An invoice generated during June stays regenerable through June 30 and
    // is locked from July 1 on.
    let june = MonthLabel::parse("June-2025").unwrap();

    assert!(june.is_editable_as_of(MonthLabel::parse("June-2025").unwrap()));
    assert!(june.is_editable_as_of(MonthLabel::parse("May-2025").unwrap()));
    assert!(!june.is_editable_as_of(MonthLabel::parse("July-2025").unwrap()));
    assert!(!june.is_editable_as_of(MonthLabel::parse("January-2026").unwrap()));
}

#[test]
fn nine_months_separate_a_june_hire_from_a_march_clock() {
    // joiningDate=2024-06-01 queried during March-2025: attendance can be
    // pending for June-2024 through February-2025 only.
    let joining = MonthLabel::from_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    let last_closed = MonthLabel::parse("March-2025").unwrap().prev();

    let months = MonthLabel::months_between(joining, last_closed);
    assert_eq!(months.len(), 9);
    assert_eq!(months.first().unwrap().to_string(), "June-2024");
    assert_eq!(months.last().unwrap().to_string(), "February-2025");
}

#[test]
fn month_labels_survive_a_serde_round_trip() {
    let month = MonthLabel::parse("January-2026").unwrap();
    let json = serde_json::to_string(&month).unwrap();
    assert_eq!(json, "\"January-2026\"");

    let parsed: MonthLabel = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, month);
}
