//! Error taxonomy shared by every table and field-type operation.
//!
//! Type mismatches are the inference mechanism itself (a candidate type is
//! dropped as soon as it rejects a value) and the way eager appends reject a
//! row. Schema mismatches always name the offending fields.

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::fields::FieldType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
    #[error("{reason}: {}", .names.iter().map(|name| format!("\"{name}\"")).join(", "))]
    SchemaMismatch { reason: String, names: Vec<String> },
    #[error("Row {row} has {found} value(s) but the header defines {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Row index {index} is out of range for a table with {len} row(s)")]
    RowIndex { index: usize, len: usize },
    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),
    #[error("Unknown locale '{0}'")]
    UnknownLocale(String),
}

impl Error {
    /// Builds a schema mismatch listing `names` once each, in sorted order.
    pub fn schema_mismatch<I, S>(reason: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(Into::into)
            .sorted()
            .dedup()
            .collect();
        Error::SchemaMismatch {
            reason: reason.into(),
            names,
        }
    }

    pub fn as_type_mismatch(&self) -> Option<&TypeMismatch> {
        match self {
            Error::TypeMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Error::SchemaMismatch { .. })
    }

    pub(crate) fn at_row(self, row: usize) -> Self {
        match self {
            Error::TypeMismatch(mismatch) => Error::TypeMismatch(mismatch.at_row(row)),
            Error::RowLength {
                expected, found, ..
            } => Error::RowLength {
                row,
                expected,
                found,
            },
            other => other,
        }
    }
}

/// A non-null value that cannot represent the requested field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub field_type: FieldType,
    pub value: String,
    pub detail: Option<String>,
    pub field: Option<String>,
    pub row: Option<usize>,
}

impl TypeMismatch {
    pub fn new(field_type: FieldType, value: impl Into<String>) -> Self {
        Self {
            field_type,
            value: value.into(),
            detail: None,
            field: None,
            row: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(row) = self.row {
            write!(f, "Row {row}: ")?;
        }
        if let Some(field) = &self.field {
            write!(f, "field '{field}': ")?;
        }
        write!(
            f,
            "Value '{}' can't be deserialized as {}",
            self.value,
            self.field_type.name()
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeMismatch {}
