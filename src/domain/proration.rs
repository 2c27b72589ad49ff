use crate::error::AppError;

/// Round to 2 decimal places (monetary amounts).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 4 decimal places (ratios).
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Attendance proration: the fraction of a month's pay earned, based on
/// days present out of the month's working days. Rounded to 4 decimal
/// places before being applied to any salary bucket.
pub fn calculate_proration_ratio(
    total_working_days: i32,
    days_present: i32,
) -> Result<f64, AppError> {
    if total_working_days <= 0 {
        return Err(AppError::InvalidAttendance(format!(
            "Invalid totalWorkingDays in attendance: {}",
            total_working_days
        )));
    }

    if days_present < 0 || days_present > total_working_days {
        return Err(AppError::InvalidAttendance(format!(
            "Invalid daysPresent in attendance: {} (totalWorkingDays={})",
            days_present, total_working_days
        )));
    }

    let ratio = round4(days_present as f64 / total_working_days as f64);
    if ratio.is_nan() {
        return Err(AppError::Calculation(format!(
            "Invalid prorationRatio: totalWorkingDays={}, daysPresent={}",
            total_working_days, days_present
        )));
    }

    Ok(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn full_attendance_is_exactly_one() {
        for days in [28, 29, 30, 31] {
            assert_eq!(calculate_proration_ratio(days, days).unwrap(), 1.0);
        }
    }

    #[test]
    fn zero_attendance_is_exactly_zero() {
        assert_eq!(calculate_proration_ratio(31, 0).unwrap(), 0.0);
    }

    #[test]
    fn ratio_is_rounded_to_four_decimals() {
        // 20 / 28 = 0.714285...
        assert_eq!(calculate_proration_ratio(28, 20).unwrap(), 0.7143);
        // 1 / 3 would recur
        assert_eq!(calculate_proration_ratio(30, 10).unwrap(), 0.3333);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(calculate_proration_ratio(0, 0).is_err());
        assert!(calculate_proration_ratio(-5, 0).is_err());
        assert!(calculate_proration_ratio(30, -1).is_err());
        assert!(calculate_proration_ratio(30, 31).is_err());
    }

    #[test]
    fn monetary_rounding() {
        assert_eq!(round2(3000.0 * 0.7143), 2142.9);
        assert_eq!(round2(1.239), 1.24);
        assert_eq!(round4(0.71428571), 0.7143);
    }
}
