//! Field types: the registry and the per-type serialize/deserialize contract.
//!
//! Each [`FieldType`] maps external strings to one canonical [`Value`]
//! variant and back. Deserializing a null token yields `None`; any other
//! string the type cannot represent is a [`TypeMismatch`]. Serializing `None`
//! yields the empty string.
//!
//! The registry order returned by [`all_types`] is the inference priority:
//! narrow types first, `Text` and `Binary` last. Changing it changes which
//! type ambiguous columns resolve to.

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use uuid::Uuid;

use crate::{
    error::{Error, TypeMismatch},
    locale::{self, NumericLocale},
    numeric,
    value::Value,
};

/// Case-insensitive tokens every field type reads as a missing value, in
/// addition to empty and whitespace-only strings.
pub const NULL_TOKENS: &[&str] = &["-", "null", "none", "nil"];

const TRUE_VALUES: &[&str] = &["true", "1", "yes"];
const FALSE_VALUES: &[&str] = &["false", "0", "no"];

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static DATE_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));
static DATETIME_REGEXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})[ T]([0-9]{2}):([0-9]{2}):([0-9]{2})$")
        .expect("valid datetime regex")
});
static EMAIL_REGEXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]+$").expect("valid email regex")
});

pub fn is_null(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || NULL_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Date,
    Datetime,
    Decimal,
    Percentage,
    Text,
    Binary,
    Email,
    Json,
    Uuid,
}

const DEFAULT_TYPES: [FieldType; 9] = [
    FieldType::Boolean,
    FieldType::Integer,
    FieldType::Float,
    FieldType::Date,
    FieldType::Datetime,
    FieldType::Decimal,
    FieldType::Percentage,
    FieldType::Text,
    FieldType::Binary,
];

const AVAILABLE_TYPES: [FieldType; 12] = [
    FieldType::Boolean,
    FieldType::Integer,
    FieldType::Float,
    FieldType::Date,
    FieldType::Datetime,
    FieldType::Decimal,
    FieldType::Percentage,
    FieldType::Text,
    FieldType::Binary,
    FieldType::Email,
    FieldType::Json,
    FieldType::Uuid,
];

/// The inference candidates, highest priority first.
pub fn all_types() -> &'static [FieldType] {
    &DEFAULT_TYPES
}

/// Every field type, including those only reachable by name or explicit
/// candidate lists.
pub fn available_types() -> &'static [FieldType] {
    &AVAILABLE_TYPES
}

pub fn by_canonical_name(name: &str) -> Result<FieldType, Error> {
    FieldType::from_str(name)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LocaleMode {
    /// Follow the innermost active [`locale::locale_scope`], naive outside of one.
    #[default]
    Ambient,
    Naive,
    Explicit(NumericLocale),
}

/// Per-call options threaded through serialize/deserialize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub grouping: bool,
    pub locale: LocaleMode,
    pub encoding: Option<&'static Encoding>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grouping(mut self, grouping: bool) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn locale(mut self, locale: NumericLocale) -> Self {
        self.locale = LocaleMode::Explicit(locale);
        self
    }

    pub fn naive(mut self) -> Self {
        self.locale = LocaleMode::Naive;
        self
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    fn resolved_encoding(&self) -> &'static Encoding {
        self.encoding.unwrap_or(UTF_8)
    }

    /// Runs `body` with the numeric locale these options resolve to.
    pub fn with_locale<R>(&self, body: impl FnOnce(Option<&NumericLocale>) -> R) -> R {
        match &self.locale {
            LocaleMode::Ambient => locale::with_current_locale(body),
            LocaleMode::Naive => body(None),
            LocaleMode::Explicit(locale) => body(Some(locale)),
        }
    }
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Boolean => "Boolean",
            FieldType::Integer => "Integer",
            FieldType::Float => "Float",
            FieldType::Date => "Date",
            FieldType::Datetime => "Datetime",
            FieldType::Decimal => "Decimal",
            FieldType::Percentage => "Percentage",
            FieldType::Text => "Text",
            FieldType::Binary => "Binary",
            FieldType::Email => "Email",
            FieldType::Json => "Json",
            FieldType::Uuid => "Uuid",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Decimal => "decimal",
            FieldType::Percentage => "percentage",
            FieldType::Text => "text",
            FieldType::Binary => "binary",
            FieldType::Email => "email",
            FieldType::Json => "json",
            FieldType::Uuid => "uuid",
        }
    }

    /// The Rust type a value of this field is stored as.
    pub fn canonical_type(self) -> &'static str {
        match self {
            FieldType::Boolean => "bool",
            FieldType::Integer => "i64",
            FieldType::Float => "f64",
            FieldType::Date => "chrono::NaiveDate",
            FieldType::Datetime => "chrono::NaiveDateTime",
            FieldType::Decimal | FieldType::Percentage => "rust_decimal::Decimal",
            FieldType::Text | FieldType::Email => "String",
            FieldType::Binary => "Vec<u8>",
            FieldType::Json => "serde_json::Value",
            FieldType::Uuid => "uuid::Uuid",
        }
    }

    /// Position in the inference order, `None` for types outside of it.
    pub fn priority(self) -> Option<usize> {
        DEFAULT_TYPES.iter().position(|candidate| *candidate == self)
    }

    /// Whether `value` already has this type's canonical representation.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Boolean, Value::Boolean(_))
                | (FieldType::Integer, Value::Integer(_))
                | (FieldType::Float, Value::Float(_))
                | (FieldType::Date, Value::Date(_))
                | (FieldType::Datetime, Value::DateTime(_))
                | (FieldType::Decimal | FieldType::Percentage, Value::Decimal(_))
                | (FieldType::Text | FieldType::Email, Value::Text(_))
                | (FieldType::Binary, Value::Binary(_))
                | (FieldType::Json, Value::Json(_))
                | (FieldType::Uuid, Value::Uuid(_))
        )
    }

    pub fn serialize(self, value: Option<&Value>, options: &FieldOptions) -> Result<String, TypeMismatch> {
        let Some(value) = value else {
            return Ok(String::new());
        };
        if !self.accepts(value) {
            return Err(TypeMismatch::new(self, value.as_display())
                .with_detail(format!("expected {}, found {}", self.canonical_type(), value.kind())));
        }
        options.with_locale(|locale| self.render(value, locale, options.grouping))
    }

    pub fn deserialize(self, raw: &str, options: &FieldOptions) -> Result<Option<Value>, TypeMismatch> {
        options.with_locale(|locale| self.parse(raw, locale))
    }

    /// Decodes `raw` with the configured encoding (UTF-8 by default) before
    /// deserializing. Binary keeps the bytes untouched.
    pub fn deserialize_bytes(self, raw: &[u8], options: &FieldOptions) -> Result<Option<Value>, TypeMismatch> {
        if self == FieldType::Binary {
            if raw.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Value::Binary(raw.to_vec())));
        }
        let encoding = options.resolved_encoding();
        let decoded = encoding
            .decode_without_bom_handling_and_without_replacement(raw)
            .ok_or_else(|| {
                TypeMismatch::new(self, String::from_utf8_lossy(raw))
                    .with_detail(format!("invalid {} bytes", encoding.name()))
            })?;
        self.deserialize(&decoded, options)
    }

    /// Serializes and encodes with the configured encoding. Binary returns the
    /// stored bytes.
    pub fn serialize_bytes(self, value: Option<&Value>, options: &FieldOptions) -> Result<Vec<u8>, TypeMismatch> {
        if self == FieldType::Binary
            && let Some(Value::Binary(bytes)) = value
        {
            return Ok(bytes.clone());
        }
        let rendered = self.serialize(value, options)?;
        let encoding = options.resolved_encoding();
        let (encoded, _, had_errors) = encoding.encode(&rendered);
        if had_errors {
            return Err(TypeMismatch::new(self, rendered.clone())
                .with_detail(format!("not representable in {}", encoding.name())));
        }
        Ok(encoded.into_owned())
    }

    /// Brings an arbitrary value to this type's canonical representation.
    /// Values that already have it pass through unchanged, strings go through
    /// [`FieldType::deserialize`], and native values of other types are
    /// converted where that is lossless. Email text is always re-validated.
    pub fn coerce(self, value: Value, options: &FieldOptions) -> Result<Option<Value>, TypeMismatch> {
        if self.accepts(&value) && self != FieldType::Email {
            return Ok(Some(value));
        }
        match (self, value) {
            (_, Value::Text(text)) => self.deserialize(&text, options),
            (_, Value::Binary(bytes)) => self.deserialize_bytes(&bytes, options),
            (FieldType::Integer, Value::Float(float)) => {
                if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                    Ok(Some(Value::Integer(float as i64)))
                } else {
                    Err(TypeMismatch::new(self, float.to_string()).with_detail("it's float, not integer"))
                }
            }
            (FieldType::Integer, Value::Decimal(decimal)) => decimal
                .fract()
                .is_zero()
                .then(|| decimal.to_i64())
                .flatten()
                .map(|int| Some(Value::Integer(int)))
                .ok_or_else(|| {
                    TypeMismatch::new(self, decimal.to_string()).with_detail("it's decimal, not integer")
                }),
            (FieldType::Float, Value::Integer(int)) => Ok(Some(Value::Float(int as f64))),
            (FieldType::Float, Value::Decimal(decimal)) => decimal
                .to_f64()
                .map(|float| Some(Value::Float(float)))
                .ok_or_else(|| TypeMismatch::new(self, decimal.to_string())),
            (FieldType::Decimal, Value::Integer(int)) => Ok(Some(Value::Decimal(Decimal::from(int)))),
            (FieldType::Decimal, Value::Float(float)) => parse_decimal_literal(&float.to_string())
                .map(|decimal| Some(Value::Decimal(decimal)))
                .ok_or_else(|| TypeMismatch::new(self, float.to_string())),
            (FieldType::Text, other) => Ok(Some(Value::Text(other.as_display()))),
            (_, other) => self.parse(&other.as_display(), None),
        }
    }

    fn parse(self, raw: &str, locale: Option<&NumericLocale>) -> Result<Option<Value>, TypeMismatch> {
        if is_null(raw) {
            return Ok(None);
        }
        let mismatch = || TypeMismatch::new(self, raw);
        let trimmed = raw.trim();
        let parsed = match self {
            FieldType::Boolean => {
                let lowered = trimmed.to_ascii_lowercase();
                if TRUE_VALUES.contains(&lowered.as_str()) {
                    Value::Boolean(true)
                } else if FALSE_VALUES.contains(&lowered.as_str()) {
                    Value::Boolean(false)
                } else {
                    return Err(mismatch().with_detail("value is not boolean"));
                }
            }
            FieldType::Integer => {
                if trimmed != "0" && trimmed.starts_with('0') {
                    return Err(mismatch().with_detail("leading zero, not an integer"));
                }
                let parsed = match locale {
                    Some(locale) => numeric::delocalize(trimmed, locale).parse::<i64>(),
                    None => trimmed.parse::<i64>(),
                };
                Value::Integer(parsed.map_err(|err| mismatch().with_detail(err.to_string()))?)
            }
            FieldType::Float => {
                let parsed = match locale {
                    Some(locale) => numeric::delocalize(trimmed, locale).parse::<f64>(),
                    None => trimmed.parse::<f64>(),
                };
                Value::Float(parsed.map_err(|err| mismatch().with_detail(err.to_string()))?)
            }
            FieldType::Decimal => Value::Decimal(parse_decimal(trimmed, locale).ok_or_else(mismatch)?),
            FieldType::Percentage => {
                let body = trimmed
                    .strip_suffix('%')
                    .ok_or_else(|| mismatch().with_detail("missing '%' suffix"))?;
                let decimal = parse_decimal(body.trim(), locale).ok_or_else(mismatch)?;
                Value::Decimal(
                    from_percent(decimal)
                        .ok_or_else(|| mismatch().with_detail("too many decimal places"))?,
                )
            }
            FieldType::Date => {
                if !DATE_REGEXP.is_match(trimmed) {
                    return Err(mismatch().with_detail("expected YYYY-MM-DD"));
                }
                let parsed = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                    .map_err(|err| mismatch().with_detail(err.to_string()))?;
                Value::Date(parsed)
            }
            FieldType::Datetime => Value::DateTime(parse_datetime(trimmed).ok_or_else(|| {
                mismatch().with_detail("expected YYYY-MM-DD HH:MM:SS")
            })?),
            FieldType::Text => Value::Text(raw.to_string()),
            FieldType::Email => {
                if !EMAIL_REGEXP.is_match(trimmed) {
                    return Err(mismatch().with_detail("not an e-mail address"));
                }
                Value::Text(trimmed.to_string())
            }
            FieldType::Binary => Value::Binary(
                hex::decode(trimmed).map_err(|err| mismatch().with_detail(err.to_string()))?,
            ),
            FieldType::Json => Value::Json(
                serde_json::from_str(raw).map_err(|err| mismatch().with_detail(err.to_string()))?,
            ),
            FieldType::Uuid => {
                let unbraced = trimmed.trim_matches(|c| matches!(c, '{' | '}'));
                Value::Uuid(Uuid::parse_str(unbraced).map_err(|err| mismatch().with_detail(err.to_string()))?)
            }
        };
        Ok(Some(parsed))
    }

    /// Renders a value already known to be canonical for this type.
    fn render(
        self,
        value: &Value,
        locale: Option<&NumericLocale>,
        grouping: bool,
    ) -> Result<String, TypeMismatch> {
        let rendered = match (self, value) {
            (FieldType::Boolean, Value::Boolean(b)) => b.to_string(),
            (FieldType::Integer, Value::Integer(int)) => match locale {
                Some(locale) => numeric::format_integer(*int, locale, grouping),
                None => int.to_string(),
            },
            (FieldType::Float, Value::Float(float)) => match locale {
                Some(locale) => numeric::format_float(*float, locale, grouping),
                None => format!("{float:?}"),
            },
            (FieldType::Decimal, Value::Decimal(decimal)) => render_decimal(decimal, locale, grouping),
            (FieldType::Percentage, Value::Decimal(decimal)) => {
                if decimal.is_zero() {
                    return Ok("0.00%".to_string());
                }
                let scaled = to_percent(*decimal).ok_or_else(|| {
                    TypeMismatch::new(self, decimal.to_string()).with_detail("too large for a percentage")
                })?;
                format!("{}%", render_decimal(&scaled, locale, grouping))
            }
            (FieldType::Date, Value::Date(date)) => date.format(DATE_FORMAT).to_string(),
            (FieldType::Datetime, Value::DateTime(datetime)) => {
                datetime.format(DATETIME_OUTPUT_FORMAT).to_string()
            }
            (FieldType::Binary, Value::Binary(bytes)) => hex::encode(bytes),
            (FieldType::Uuid, Value::Uuid(uuid)) => uuid.hyphenated().to_string(),
            (_, other) => other.as_display(),
        };
        Ok(rendered)
    }
}

/// `value * 100` by moving the decimal point where the scale allows it.
fn to_percent(value: Decimal) -> Option<Decimal> {
    let scale = value.scale();
    if scale >= 2 {
        let mut scaled = value;
        scaled.set_scale(scale - 2).ok()?;
        Some(scaled)
    } else {
        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|scaled| scaled.round_dp(0))
    }
}

/// `value / 100`, or `None` when the result needs more than 28 decimal places.
fn from_percent(value: Decimal) -> Option<Decimal> {
    let mut scaled = value;
    scaled.set_scale(value.scale() + 2).ok()?;
    Some(scaled)
}

fn render_decimal(decimal: &Decimal, locale: Option<&NumericLocale>, grouping: bool) -> String {
    match locale {
        Some(locale) => numeric::format_decimal(decimal, locale, grouping),
        None => decimal.to_string(),
    }
}

fn parse_decimal(value: &str, locale: Option<&NumericLocale>) -> Option<Decimal> {
    match locale {
        Some(locale) => numeric::parse_localized_decimal(value, locale),
        None => parse_decimal_literal(value),
    }
}

pub fn parse_decimal_literal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed).ok()
    } else {
        numeric::parse_exact_decimal(trimmed)
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let captures = DATETIME_REGEXP.captures(value)?;
    let part = |idx: usize| -> Option<u32> { captures.get(idx)?.as_str().parse().ok() };
    let year = i32::try_from(part(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, part(2)?, part(3)?)?.and_hms_opt(part(4)?, part(5)?, part(6)?)
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let normalized = normalized.strip_suffix("field").unwrap_or(&normalized);
        match normalized {
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "integer" | "int" => Ok(FieldType::Integer),
            "float" | "double" => Ok(FieldType::Float),
            "date" => Ok(FieldType::Date),
            "datetime" | "date-time" | "timestamp" => Ok(FieldType::Datetime),
            "decimal" | "numeric" => Ok(FieldType::Decimal),
            "percentage" | "percent" => Ok(FieldType::Percentage),
            "text" | "string" | "str" => Ok(FieldType::Text),
            "binary" | "bytes" => Ok(FieldType::Binary),
            "email" => Ok(FieldType::Email),
            "json" => Ok(FieldType::Json),
            "uuid" | "guid" => Ok(FieldType::Uuid),
            _ => Err(Error::UnknownFieldType(value.to_string())),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        FieldType::from_str(&token).map_err(de::Error::custom)
    }
}
