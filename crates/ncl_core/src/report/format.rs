//! Display formatting for amounts, shares and dates.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// `$1,234,567.89`; negative values keep a leading minus.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{fraction}")
}

/// One-decimal percentage, e.g. `35.8%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// Long date, e.g. `31 December 2024`.
pub fn format_date(value: NaiveDate) -> String {
    value.format("%-d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_amount, format_date, format_percent};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn amounts_get_thousands_separators() {
        assert_eq!(format_amount(Decimal::new(123_456_789, 2)), "$1,234,567.89");
        assert_eq!(format_amount(Decimal::new(99_999, 2)), "$999.99");
        assert_eq!(format_amount(Decimal::ZERO), "$0.00");
        assert_eq!(format_amount(Decimal::new(-1_000_000, 2)), "-$10,000.00");
        assert_eq!(format_amount(Decimal::new(1_005, 3)), "$1.01");
    }

    #[test]
    fn percent_and_date_formats() {
        assert_eq!(format_percent(35.849), "35.8%");
        assert_eq!(format_percent(0.0), "0.0%");
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date");
        assert_eq!(format_date(date), "31 December 2024");
    }
}
