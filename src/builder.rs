//! `create_table`: turns a header row plus data rows into a typed [`Table`].
//!
//! Rows are pulled from the source once. When the schema has to be inferred,
//! the first `samples` data rows are buffered, inspected, and then replayed
//! ahead of the rest of the source, so lazily produced rows are never
//! requested twice.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    error::{Error, Result},
    fields::{FieldOptions, FieldType},
    header::{make_header, normalize_name},
    inference::{DetectionConfig, detect_types},
    schema::Schema,
    table::{Meta, Row, Table},
    value::{IntoCell, Value},
};

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Explicit schema, in data column order. Skips inference.
    pub fields: Option<Schema>,
    /// With explicit `fields`, drop the first row of the source.
    pub skip_header: bool,
    /// Restrict and reorder the resulting table to these fields.
    pub import_fields: Option<Vec<String>>,
    /// Number of data rows inspected by inference; all rows when unset.
    pub samples: Option<usize>,
    /// Types that replace the inferred ones, or the explicit `fields` types
    /// when a schema is given. Names are normalized like headers.
    pub force_types: Vec<(String, FieldType)>,
    pub max_rows: Option<usize>,
    pub meta: Meta,
    pub field_options: FieldOptions,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            fields: None,
            skip_header: true,
            import_fields: None,
            samples: None,
            force_types: Vec::new(),
            max_rows: None,
            meta: Meta::new(),
            field_options: FieldOptions::default(),
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, fields: Schema) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn skip_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    pub fn import_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.import_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn force_type(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.force_types.push((name.into(), field_type));
        self
    }

    pub fn force_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        self.force_types
            .extend(types.into_iter().map(|(name, field_type)| (name.into(), field_type)));
        self
    }

    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn field_options(mut self, options: FieldOptions) -> Self {
        self.field_options = options;
        self
    }

    fn sample_limit(&self) -> Option<usize> {
        match (self.samples, self.max_rows) {
            (Some(samples), Some(max_rows)) => Some(samples.min(max_rows)),
            (samples, max_rows) => samples.or(max_rows),
        }
    }

    fn normalized_force_types(&self) -> Vec<(String, FieldType)> {
        self.force_types
            .iter()
            .enumerate()
            .map(|(idx, (name, field_type))| (normalize_name(name, idx), *field_type))
            .collect()
    }

    fn normalized_import_fields(&self) -> Option<Vec<String>> {
        self.import_fields.as_ref().map(|names| {
            names
                .iter()
                .enumerate()
                .map(|(idx, name)| normalize_name(name, idx))
                .collect()
        })
    }
}

fn ensure_known<'a, I>(header: &[String], names: I, reason: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let missing: Vec<&String> = names
        .into_iter()
        .filter(|name| !header.contains(name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::schema_mismatch(reason, missing.into_iter().cloned()))
    }
}

fn header_cell(cell: &Option<Value>) -> String {
    cell.as_ref().map(Value::as_display).unwrap_or_default()
}

/// Moves the cells at `positions` out of `row`, in that order.
fn project(mut row: Row, positions: &[usize]) -> Row {
    positions
        .iter()
        .map(|&idx| row.get_mut(idx).and_then(Option::take))
        .collect()
}

/// Builds a table from a header row followed by data rows.
///
/// Without explicit `fields` the first row names the columns (normalized
/// with [`make_header`]) and the types are inferred from a sample of the
/// data rows. Forced types always win and their columns are not inspected.
/// Every data row is then appended through its column's field type; the
/// first row that does not fit fails the whole call.
pub fn create_table<I, R, V>(data: I, options: &TableOptions) -> Result<Table>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = V>,
    V: IntoCell,
{
    let mut rows = data
        .into_iter()
        .map(|row| row.into_iter().map(IntoCell::into_cell).collect::<Row>());
    let force_types = options.normalized_force_types();
    let import_fields = options.normalized_import_fields();

    let (schema, sample) = match &options.fields {
        Some(fields) => {
            if options.skip_header {
                rows.next();
            }
            let names = make_header(fields.field_names());
            ensure_known(&names, force_types.iter().map(|(name, _)| name), "Invalid force_types field names")?;
            ensure_known(&names, import_fields.iter().flatten(), "Invalid import_fields field names")?;
            let schema = Schema::from_pairs(names.into_iter().zip(fields.field_types()))?;
            (schema, Vec::new())
        }
        None => {
            let Some(header_row) = rows.next() else {
                debug!("Source has no header row");
                return Ok(Table::with_meta(Schema::new(), options.meta.clone()));
            };
            let header = make_header(header_row.iter().map(header_cell));
            ensure_known(&header, force_types.iter().map(|(name, _)| name), "Invalid force_types field names")?;
            ensure_known(&header, import_fields.iter().flatten(), "Invalid import_fields field names")?;

            let sample: Vec<Row> = match options.sample_limit() {
                Some(limit) => rows.by_ref().take(limit).collect(),
                None => rows.by_ref().collect(),
            };
            let forced: HashSet<&str> = force_types.iter().map(|(name, _)| name.as_str()).collect();
            let imported: Option<HashSet<&str>> = import_fields
                .as_ref()
                .map(|names| names.iter().map(String::as_str).collect());
            let skip_indexes = header.iter().enumerate().filter_map(|(idx, name)| {
                let not_imported = imported
                    .as_ref()
                    .is_some_and(|imported| !imported.contains(name.as_str()));
                (forced.contains(name.as_str()) || not_imported).then_some(idx)
            });
            let mut config = DetectionConfig::new()
                .skip_indexes(skip_indexes)
                .field_options(options.field_options.clone());
            if sample.is_empty() {
                config = config.fallback(FieldType::Text);
            }
            debug!("Detecting field types from {} sample row(s)", sample.len());
            (detect_types(&header, &sample, &config)?, sample)
        }
    };

    let mut schema = schema;
    for (name, field_type) in &force_types {
        schema.set_type(name, *field_type)?;
    }
    let width = schema.len();

    let (schema, positions) = match &import_fields {
        Some(names) => {
            let selected = schema.select(names)?;
            let positions: Vec<usize> = names.iter().filter_map(|name| schema.position(name)).collect();
            (selected, Some(positions))
        }
        None => (schema, None),
    };

    let mut table = Table::with_meta(schema, options.meta.clone());
    let limit = options.max_rows.unwrap_or(usize::MAX);
    for (row_number, row) in sample.into_iter().chain(rows).take(limit).enumerate() {
        if row.len() > width {
            return Err(Error::RowLength {
                row: row_number,
                expected: width,
                found: row.len(),
            });
        }
        let row = match &positions {
            Some(positions) => project(row, positions),
            None => row,
        };
        table.append_with(row, &options.field_options)?;
    }

    info!(
        "Created table with {} field(s) and {} row(s)",
        table.fields().len(),
        table.len()
    );
    Ok(table)
}
