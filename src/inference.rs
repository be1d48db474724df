//! Column type inference by elimination.
//!
//! Every column starts with the full ordered candidate list. Each distinct
//! non-null sample value is deserialized with every remaining candidate and
//! candidates that reject it are dropped. The first survivor in priority
//! order wins.

use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};

use crate::{
    error::{Result, TypeMismatch},
    fields::{self, FieldOptions, FieldType},
    schema::Schema,
    value::Value,
};

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub field_types: Vec<FieldType>,
    /// Column positions that are not inspected and resolve to Text.
    pub skip_indexes: BTreeSet<usize>,
    /// Type for columns with no non-null evidence.
    pub fallback: FieldType,
    pub field_options: FieldOptions,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            field_types: fields::all_types().to_vec(),
            skip_indexes: BTreeSet::new(),
            fallback: FieldType::Binary,
            field_options: FieldOptions::default(),
        }
    }
}

impl DetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_types(mut self, field_types: impl Into<Vec<FieldType>>) -> Self {
        self.field_types = field_types.into();
        self
    }

    pub fn skip_indexes(mut self, indexes: impl IntoIterator<Item = usize>) -> Self {
        self.skip_indexes = indexes.into_iter().collect();
        self
    }

    pub fn fallback(mut self, fallback: FieldType) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn field_options(mut self, options: FieldOptions) -> Self {
        self.field_options = options;
        self
    }
}

#[derive(Debug, Clone)]
struct TypeCandidates {
    remaining: Vec<FieldType>,
}

impl TypeCandidates {
    fn new(field_types: &[FieldType]) -> Self {
        Self {
            remaining: field_types.to_vec(),
        }
    }

    fn eliminate(&mut self, value: &Value, options: &FieldOptions) {
        self.remaining.retain(|candidate| match try_type(*candidate, value, options) {
            Ok(_) => true,
            Err(mismatch) => {
                trace!("Eliminated {candidate}: {mismatch}");
                false
            }
        });
    }

    fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    fn decide(&self, fallback: FieldType) -> FieldType {
        self.remaining.first().copied().unwrap_or(fallback)
    }
}

fn try_type(field_type: FieldType, value: &Value, options: &FieldOptions) -> Result<(), TypeMismatch> {
    match value {
        Value::Text(text) => field_type.deserialize(text, options).map(|_| ()),
        Value::Binary(bytes) => field_type.deserialize_bytes(bytes, options).map(|_| ()),
        other => field_type.coerce(other.clone(), options).map(|_| ()),
    }
}

fn is_null_cell(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Text(text)) => fields::is_null(text),
        Some(Value::Binary(bytes)) => bytes.is_empty(),
        Some(_) => false,
    }
}

/// Infers one column from its sampled cells.
pub fn detect_column<'a, I>(cells: I, config: &DetectionConfig) -> FieldType
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut seen_text: HashSet<&str> = HashSet::new();
    let mut evidence: Vec<&Value> = Vec::new();
    for value in cells.into_iter().flatten() {
        if is_null_cell(Some(value)) {
            continue;
        }
        if let Value::Text(text) = value
            && !seen_text.insert(text.as_str())
        {
            continue;
        }
        evidence.push(value);
    }

    if evidence.is_empty() {
        return config.fallback;
    }
    if evidence.iter().all(|value| matches!(value, Value::Binary(_))) {
        return FieldType::Binary;
    }

    let mut candidates = TypeCandidates::new(&config.field_types);
    for value in evidence {
        candidates.eliminate(value, &config.field_options);
        if candidates.is_exhausted() {
            break;
        }
    }
    candidates.decide(config.fallback)
}

/// Builds a schema for `field_names` from a sample of raw rows. Rows whose
/// length differs from the header are left out of the sample.
pub fn detect_types<S, R>(field_names: &[S], rows: &[R], config: &DetectionConfig) -> Result<Schema>
where
    S: AsRef<str>,
    R: AsRef<[Option<Value>]>,
{
    let width = field_names.len();
    let sample: Vec<&[Option<Value>]> = rows
        .iter()
        .map(AsRef::as_ref)
        .filter(|row| row.len() == width)
        .collect();
    let excluded = rows.len() - sample.len();
    if excluded > 0 {
        debug!("Excluded {excluded} ragged row(s) from the type detection sample");
    }

    let mut schema = Schema::new();
    for (idx, name) in field_names.iter().enumerate() {
        let name = name.as_ref();
        let field_type = if config.skip_indexes.contains(&idx) {
            FieldType::Text
        } else {
            let detected = detect_column(sample.iter().map(|row| row[idx].as_ref()), config);
            debug!("Detected field '{name}' as {detected}");
            detected
        };
        schema.push(name, field_type)?;
    }
    Ok(schema)
}
