//! Locale-aware number parsing and formatting primitives.
//!
//! These helpers only run while a [`NumericLocale`] is in effect; the
//! locale-naive paths live directly in the field types.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::locale::NumericLocale;

const FLOAT_LOCALE_PLACES: usize = 6;

/// Removes thousands separators and maps the locale decimal point to `.`,
/// leaving a string the plain Rust parsers understand.
pub(crate) fn delocalize(value: &str, locale: &NumericLocale) -> String {
    let mut normalized = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if Some(ch) == locale.thousands_sep {
            continue;
        }
        if ch == locale.decimal_point {
            normalized.push('.');
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

pub(crate) fn group_digits(digits: &str, separator: char, group_size: usize) -> String {
    if group_size == 0 || digits.len() <= group_size {
        return digits.to_string();
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / group_size);
    let lead = digits.len() % group_size;
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (idx + group_size - lead) % group_size == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Joins an unsigned rendering (`1234.50`) back together with locale separators.
fn localize_unsigned(rendered: &str, negative: bool, locale: &NumericLocale, grouping: bool) -> String {
    let (integer, fraction) = match rendered.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (rendered, None),
    };
    let mut output = String::with_capacity(rendered.len() + 4);
    if negative {
        output.push('-');
    }
    match locale.thousands_sep {
        Some(separator) if grouping => {
            output.push_str(&group_digits(integer, separator, locale.grouping))
        }
        _ => output.push_str(integer),
    }
    if let Some(fraction) = fraction {
        output.push(locale.decimal_point);
        output.push_str(fraction);
    }
    output
}

pub(crate) fn format_integer(value: i64, locale: &NumericLocale, grouping: bool) -> String {
    localize_unsigned(&value.unsigned_abs().to_string(), value < 0, locale, grouping)
}

/// Fixed six decimal places, the way `printf("%f")` renders under a locale.
pub(crate) fn format_float(value: f64, locale: &NumericLocale, grouping: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rendered = format!("{:.*}", FLOAT_LOCALE_PLACES, value.abs());
    let negative = value.is_sign_negative() && value != 0.0;
    localize_unsigned(&rendered, negative, locale, grouping)
}

/// Keeps exactly the decimal places stored in `value`.
pub(crate) fn format_decimal(value: &Decimal, locale: &NumericLocale, grouping: bool) -> String {
    let rendered = value.abs().to_string();
    localize_unsigned(&rendered, value.is_sign_negative() && !value.is_zero(), locale, grouping)
}

/// Parses a decimal written with the locale's separators. Anything besides
/// digits, the configured separators, a leading sign, and spaces is rejected.
pub(crate) fn parse_localized_decimal(value: &str, locale: &NumericLocale) -> Option<Decimal> {
    let permitted = |ch: char| {
        ch.is_ascii_digit()
            || ch == ' '
            || ch == '-'
            || ch == '+'
            || ch == locale.decimal_point
            || Some(ch) == locale.thousands_sep
    };
    if !value.chars().all(permitted) {
        return None;
    }

    let trimmed = value.trim();
    let (negative, body) = match trimmed.chars().next() {
        Some('-') => (true, &trimmed[1..]),
        Some('+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.contains(['-', '+']) {
        return None;
    }

    let parts: Vec<String> = body
        .split(locale.decimal_point)
        .map(|part| part.chars().filter(char::is_ascii_digit).collect())
        .collect();
    let literal = match parts.as_slice() {
        [integer] if !integer.is_empty() => integer.clone(),
        [integer, fraction] if !integer.is_empty() && !fraction.is_empty() => {
            format!("{integer}.{fraction}")
        }
        _ => return None,
    };
    let parsed = parse_exact_decimal(&literal)?;
    Some(if negative { -parsed } else { parsed })
}

/// Parses a plain decimal literal, rejecting input with more significant
/// fractional digits than a 96-bit mantissa keeps.
pub(crate) fn parse_exact_decimal(literal: &str) -> Option<Decimal> {
    let parsed = Decimal::from_str(literal).ok()?;
    let fraction_digits = literal
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len());
    (fraction_digits <= parsed.scale() as usize).then_some(parsed)
}
