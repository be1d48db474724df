//! In-memory typed tables.
//!
//! A [`Table`] owns a [`Schema`] and rows positionally aligned with it. Every
//! write goes through the column's field type, so a stored cell is always
//! `None` or the canonical [`Value`] of its column. A rejected row leaves the
//! table untouched.

use std::{collections::BTreeMap, fmt, ops::Add, ops::Index, path::Path};

use crate::{
    error::{Error, Result},
    fields::{FieldOptions, FieldType},
    schema::Schema,
    value::{ComparableValue, IntoCell, Value},
};

/// Opaque provenance attached by whoever built the table.
pub type Meta = BTreeMap<String, serde_json::Value>;

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    fields: Schema,
    rows: Vec<Row>,
    meta: Meta,
}

/// A borrowed row together with the schema it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    fields: &'a Schema,
    values: &'a [Option<Value>],
}

impl<'a> Record<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.fields.position(name)?;
        self.values.get(idx)?.as_ref()
    }

    pub fn values(&self) -> &'a [Option<Value>] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a Value>)> + use<'a> {
        self.fields
            .iter()
            .zip(self.values.iter())
            .map(|((name, _), value)| (name, value.as_ref()))
    }

    pub fn to_owned_row(&self) -> Row {
        self.values.to_vec()
    }
}

impl Index<&str> for Record<'_> {
    type Output = Option<Value>;

    fn index(&self, name: &str) -> &Self::Output {
        match self.fields.position(name) {
            Some(idx) => &self.values[idx],
            None => panic!("no field named '{name}'"),
        }
    }
}

pub struct Records<'a> {
    fields: &'a Schema,
    rows: std::slice::Iter<'a, Row>,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| Record {
            fields: self.fields,
            values: row,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Records<'_> {}

impl Table {
    pub fn new(fields: Schema) -> Self {
        Self::with_meta(fields, Meta::new())
    }

    pub fn with_meta(fields: Schema, meta: Meta) -> Self {
        Self {
            fields,
            rows: Vec::new(),
            meta,
        }
    }

    pub fn fields(&self) -> &Schema {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.field_names()
    }

    pub fn field_types(&self) -> Vec<FieldType> {
        self.fields.field_types()
    }

    /// The field-name row written ahead of [`Table::serialize_rows`] output.
    pub fn header(&self) -> Vec<String> {
        self.field_names()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    /// `meta["name"]` when set, otherwise the stem of `meta["filename"]`.
    pub fn name(&self) -> Option<String> {
        if let Some(name) = self.meta.get("name").and_then(serde_json::Value::as_str) {
            return Some(name.to_string());
        }
        let filename = self.meta.get("filename")?.as_str()?;
        Path::new(filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn is_neutral(&self) -> bool {
        self.fields.is_empty() && self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Coerces a raw row through the schema. Short rows are padded with
    /// `None`; long rows are rejected.
    fn typed_row<R, V>(&self, row: R, row_number: usize, options: &FieldOptions) -> Result<Row>
    where
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        let raw: Vec<Option<Value>> = row.into_iter().map(IntoCell::into_cell).collect();
        let expected = self.fields.len();
        if raw.len() > expected {
            return Err(Error::RowLength {
                row: row_number,
                expected,
                found: raw.len(),
            });
        }
        let mut typed = Vec::with_capacity(expected);
        let mut raw = raw.into_iter();
        for column in self.fields.columns() {
            let cell = match raw.next().flatten() {
                None => None,
                Some(value) => column.field_type.coerce(value, options).map_err(|mismatch| {
                    mismatch.in_field(column.name.clone()).at_row(row_number)
                })?,
            };
            typed.push(cell);
        }
        Ok(typed)
    }

    pub fn append<R, V>(&mut self, row: R) -> Result<()>
    where
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        self.append_with(row, &FieldOptions::default())
    }

    pub fn append_with<R, V>(&mut self, row: R, options: &FieldOptions) -> Result<()>
    where
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        let typed = self.typed_row(row, self.rows.len(), options)?;
        self.rows.push(typed);
        Ok(())
    }

    /// Appends a row given as `(field name, value)` pairs. Fields left out
    /// are `None`; names outside the schema are rejected.
    pub fn append_record<I, K, V>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoCell,
    {
        let mut row: Row = vec![None; self.fields.len()];
        let mut unknown = Vec::new();
        for (name, value) in record {
            let name = name.as_ref();
            match self.fields.position(name) {
                Some(idx) => row[idx] = value.into_cell(),
                None => unknown.push(name.to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(Error::schema_mismatch("Unknown field names", unknown));
        }
        self.append(row)
    }

    pub fn insert<R, V>(&mut self, index: usize, row: R) -> Result<()>
    where
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        if index > self.rows.len() {
            return Err(Error::RowIndex {
                index,
                len: self.rows.len(),
            });
        }
        let typed = self.typed_row(row, index, &FieldOptions::default())?;
        self.rows.insert(index, typed);
        Ok(())
    }

    pub fn set<R, V>(&mut self, index: usize, row: R) -> Result<()>
    where
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        if index >= self.rows.len() {
            return Err(Error::RowIndex {
                index,
                len: self.rows.len(),
            });
        }
        self.rows[index] = self.typed_row(row, index, &FieldOptions::default())?;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Row> {
        if index >= self.rows.len() {
            return Err(Error::RowIndex {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Appends every row or none of them.
    pub fn extend<I, R, V>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: IntoCell,
    {
        let options = FieldOptions::default();
        let start = self.rows.len();
        let typed = rows
            .into_iter()
            .enumerate()
            .map(|(offset, row)| self.typed_row(row, start + offset, &options))
            .collect::<Result<Vec<_>>>()?;
        self.rows.extend(typed);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|row| Record {
            fields: &self.fields,
            values: row,
        })
    }

    pub fn iter(&self) -> Records<'_> {
        Records {
            fields: &self.fields,
            rows: self.rows.iter(),
        }
    }

    pub fn column(&self, name: &str) -> Result<Vec<Option<&Value>>> {
        let idx = self
            .fields
            .position(name)
            .ok_or_else(|| Error::schema_mismatch("Unknown field names", [name]))?;
        Ok(self.rows.iter().map(|row| row[idx].as_ref()).collect())
    }

    /// Sorts rows by one field, `"-name"` for descending. Missing values sort
    /// first when ascending; ties keep their order.
    pub fn order_by(&mut self, key: &str) -> Result<()> {
        let (name, descending) = match key.strip_prefix('-') {
            Some(name) => (name, true),
            None => (key, false),
        };
        let idx = self
            .fields
            .position(name)
            .ok_or_else(|| Error::schema_mismatch("Unknown field names", [name]))?;
        self.rows.sort_by(|left, right| {
            let ordering = ComparableValue(left[idx].as_ref()).cmp(&ComparableValue(right[idx].as_ref()));
            if descending { ordering.reverse() } else { ordering }
        });
        Ok(())
    }

    /// Concatenates two tables with identical schemas. The empty default table
    /// is neutral on either side.
    pub fn concat(&self, other: &Table) -> Result<Table> {
        if other.is_neutral() {
            return Ok(self.clone());
        }
        if self.is_neutral() {
            return Ok(other.clone());
        }
        self.fields.ensure_same(&other.fields)?;
        let mut combined = self.clone();
        combined.rows.extend(other.rows.iter().cloned());
        Ok(combined)
    }

    pub fn sum<I>(tables: I) -> Result<Table>
    where
        I: IntoIterator<Item = Table>,
    {
        tables
            .into_iter()
            .try_fold(Table::default(), |total, table| total + table)
    }

    /// Renders every row to strings through the column field types.
    pub fn serialize_rows(&self, options: &FieldOptions) -> Result<Vec<Vec<String>>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row_number, row)| {
                self.fields
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, value)| {
                        column
                            .field_type
                            .serialize(value.as_ref(), options)
                            .map_err(|mismatch| {
                                Error::from(mismatch.in_field(column.name.clone()).at_row(row_number))
                            })
                    })
                    .collect::<Result<Vec<String>>>()
            })
            .collect()
    }
}

impl Add for Table {
    type Output = Result<Table>;

    fn add(mut self, other: Table) -> Self::Output {
        if other.is_neutral() {
            return Ok(self);
        }
        if self.is_neutral() {
            return Ok(other);
        }
        self.fields.ensure_same(&other.fields)?;
        self.rows.extend(other.rows);
        Ok(self)
    }
}

impl Index<usize> for Table {
    type Output = [Option<Value>];

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = Record<'a>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Table {} fields, {} rows>", self.fields.len(), self.rows.len())
    }
}
