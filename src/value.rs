//! Canonical in-memory cell values.
//!
//! Every field type targets exactly one [`Value`] variant (Percentage and
//! Decimal share [`Value::Decimal`], Email shares [`Value::Text`]). A missing
//! cell is `None` at the row level, never a variant of its own.

use std::{cmp::Ordering, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    Binary(Vec<u8>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Text(_) => "text",
            Value::Binary(_) => "binary",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Plain rendering used when a value of one type is re-read as another.
    pub fn as_display(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Text(s) => s.clone(),
            Value::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(json) => json.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_) => 1,
            Value::Date(_) => 2,
            Value::DateTime(_) => 3,
            Value::Text(_) => 4,
            Value::Binary(_) => 5,
            Value::Uuid(_) => 6,
            Value::Json(_) => 7,
        }
    }

    /// Total order used for sorting. Numbers compare across their variants;
    /// otherwise values of different kinds order by kind.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Value::Integer(a), Value::Decimal(b)) => Decimal::from(*a).cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.cmp(&Decimal::from(*b)),
            (Value::Float(a), Value::Decimal(b)) => a.total_cmp(&b.to_f64().unwrap_or(f64::NAN)),
            (Value::Decimal(a), Value::Float(b)) => a.to_f64().unwrap_or(f64::NAN).total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Json(a), Value::Json(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

/// Conversion into a raw row cell. `None` marks a missing value.
pub trait IntoCell {
    fn into_cell(self) -> Option<Value>;
}

impl IntoCell for Value {
    fn into_cell(self) -> Option<Value> {
        Some(self)
    }
}

impl IntoCell for Option<Value> {
    fn into_cell(self) -> Option<Value> {
        self
    }
}

impl IntoCell for &Value {
    fn into_cell(self) -> Option<Value> {
        Some(self.clone())
    }
}

macro_rules! into_cell_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoCell for $ty {
                fn into_cell(self) -> Option<Value> {
                    Some(Value::from(self))
                }
            }

            impl IntoCell for Option<$ty> {
                fn into_cell(self) -> Option<Value> {
                    self.map(Value::from)
                }
            }
        )*
    };
}

into_cell_via_value!(
    &str,
    String,
    &String,
    bool,
    i64,
    i32,
    f64,
    Decimal,
    NaiveDate,
    NaiveDateTime,
    Vec<u8>,
    Uuid,
    serde_json::Value,
);

/// Sort key wrapper for an optional cell: missing values order first.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparableValue<'a>(pub Option<&'a Value>);

impl Eq for ComparableValue<'_> {}

impl Ord for ComparableValue<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(left), Some(right)) => left.total_cmp(right),
        }
    }
}

impl PartialOrd for ComparableValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparable_value_orders_none_before_some() {
        let zero = Value::Integer(0);
        assert!(ComparableValue(None) < ComparableValue(Some(&zero)));
    }

    #[test]
    fn numbers_compare_across_variants() {
        let int = Value::Integer(2);
        let float = Value::Float(2.5);
        let decimal = Value::Decimal(Decimal::new(15, 1));
        assert_eq!(int.total_cmp(&float), Ordering::Less);
        assert_eq!(int.total_cmp(&decimal), Ordering::Greater);
        assert_eq!(decimal.total_cmp(&float), Ordering::Less);
    }

    #[test]
    fn as_display_uses_iso_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(Value::Date(date).as_display(), "2024-05-06");
        let dt = date.and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(Value::DateTime(dt).as_display(), "2024-05-06T14:30:00");
    }
}
