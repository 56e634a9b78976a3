//! Display formatting for prices, volumes and percentages.

use chrono::{DateTime, Local};
use num_format::{Locale, ToFormattedString};

use super::core::state::Language;

pub const MISSING: &str = "—";

pub fn locale_for(language: Language) -> Locale {
    match language {
        Language::En => Locale::en,
        Language::Tr => Locale::tr,
    }
}

/// `value` rounded to `decimals` places with locale digit grouping.
pub fn grouped(value: f64, decimals: usize, locale: &Locale) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut out = String::new();
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    match int_part.parse::<u64>() {
        Ok(int) => out.push_str(&int.to_formatted_string(locale)),
        // Beyond u64: ungrouped digits.
        Err(_) => out.push_str(int_part),
    }
    if !frac_part.is_empty() {
        out.push_str(locale.decimal());
        out.push_str(frac_part);
    }
    out
}

/// Dollar amount, abbreviated above a million and given more decimals the
/// smaller it gets.
pub fn format_currency(value: Option<f64>, locale: &Locale) -> String {
    let v = match value {
        Some(v) if v.is_finite() => v,
        _ => return MISSING.to_string(),
    };
    let sign = if v < 0.0 { "-" } else { "" };
    let a = v.abs();

    let body = if a >= 1e12 {
        format!("{}T", grouped(a / 1e12, 2, locale))
    } else if a >= 1e9 {
        format!("{}B", grouped(a / 1e9, 2, locale))
    } else if a >= 1e6 {
        format!("{}M", grouped(a / 1e6, 2, locale))
    } else if a >= 1e3 {
        grouped(a, 0, locale)
    } else if a >= 1.0 {
        grouped(a, 2, locale)
    } else if a >= 0.01 {
        grouped(a, 4, locale)
    } else {
        grouped(a, 6, locale)
    };
    format!("{}${}", sign, body)
}

pub fn format_large_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let a = v.abs();
            if a >= 1e12 {
                format!("{:.2}T", v / 1e12)
            } else if a >= 1e9 {
                format!("{:.2}B", v / 1e9)
            } else if a >= 1e6 {
                format!("{:.2}M", v / 1e6)
            } else if a >= 1e3 {
                format!("{:.1}K", v / 1e3)
            } else {
                format!("{:.0}", v)
            }
        }
        _ => MISSING.to_string(),
    }
}

pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v >= 0.0 { "+" } else { "" };
            format!("{}{:.2}%", sign, v)
        }
        _ => MISSING.to_string(),
    }
}

/// Coin quantities: up to 8 decimals, trailing zeros dropped.
pub fn format_quantity(value: f64, locale: &Locale) -> String {
    let decimals = if value.abs() >= 1.0 { 4 } else { 8 };
    let text = grouped(value, decimals, locale);
    let decimal = locale.decimal();
    if text.contains(decimal) {
        text.trim_end_matches('0').trim_end_matches(decimal).to_string()
    } else {
        text
    }
}

pub fn time_ago(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let diff = (now - then).num_seconds().max(0);
    if diff < 60 {
        format!("{}s ago", diff)
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86_400 {
        format!("{}h ago", diff / 3600)
    } else {
        format!("{}d ago", diff / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn currency_tiers() {
        let en_locale = Locale::en;
        assert_eq!(format_currency(Some(2.5e12), &en_locale), "$2.50T");
        assert_eq!(format_currency(Some(1.234e9), &en_locale), "$1.23B");
        assert_eq!(format_currency(Some(5_600_000.0), &en_locale), "$5.60M");
        assert_eq!(format_currency(Some(64_321.7), &en_locale), "$64,322");
        assert_eq!(format_currency(Some(12.3), &en_locale), "$12.30");
        assert_eq!(format_currency(Some(0.5), &en_locale), "$0.5000");
        assert_eq!(format_currency(Some(0.001234), &en_locale), "$0.001234");
        assert_eq!(format_currency(None, &en_locale), MISSING);
        assert_eq!(format_currency(Some(f64::NAN), &en_locale), MISSING);
    }

    #[test]
    fn currency_follows_locale_separators() {
        let tr_locale = Locale::tr;
        assert_eq!(format_currency(Some(64_321.7), &tr_locale), "$64.322");
        assert_eq!(format_currency(Some(12.3), &tr_locale), "$12,30");
    }

    #[test]
    fn large_numbers_and_percentages() {
        assert_eq!(format_large_number(Some(1_500.0)), "1.5K");
        assert_eq!(format_large_number(Some(999.0)), "999");
        assert_eq!(format_large_number(Some(3.2e9)), "3.20B");
        assert_eq!(format_percentage(Some(1.234)), "+1.23%");
        assert_eq!(format_percentage(Some(-0.5)), "-0.50%");
        assert_eq!(format_percentage(Some(0.0)), "+0.00%");
        assert_eq!(format_percentage(None), MISSING);
    }

    #[test]
    fn quantities_drop_trailing_zeros() {
        assert_eq!(format_quantity(10.0, &Locale::en), "10");
        assert_eq!(format_quantity(0.025, &Locale::en), "0.025");
        assert_eq!(format_quantity(1234.5, &Locale::en), "1,234.5");
    }

    #[test]
    fn grouping_beyond_u64_keeps_the_digits() {
        assert_eq!(grouped(2e19, 0, &Locale::en), "20000000000000000000");
        assert_eq!(grouped(-2e19, 1, &Locale::en), "-20000000000000000000.0");
        assert_eq!(grouped(1.8e19, 0, &Locale::en), "18,000,000,000,000,000,000");
    }

    #[test]
    fn relative_times() {
        let now = Local::now();
        assert_eq!(time_ago(now - Duration::seconds(5), now), "5s ago");
        assert_eq!(time_ago(now - Duration::seconds(130), now), "2m ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2d ago");
    }
}
