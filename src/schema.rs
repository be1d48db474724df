//! Column schema: an ordered, uniquely named list of field types.
//!
//! Order defines the row layout and the output column order. Schemas can be
//! persisted as YAML so a detected layout can be reviewed, edited, and fed
//! back as an explicit schema.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    fields::FieldType,
};

const CURRENT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnMeta>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    #[serde(default)]
    fields: Vec<ColumnMeta>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut schema = Self::new();
        for (name, field_type) in pairs {
            schema.push(name, field_type)?;
        }
        Ok(schema)
    }

    pub fn push(&mut self, name: impl Into<String>, field_type: FieldType) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::schema_mismatch("Duplicate field names", [name]));
        }
        self.columns.push(ColumnMeta { name, field_type });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.columns
            .iter()
            .map(|column| (column.name.as_str(), column.field_type))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn field_types(&self) -> Vec<FieldType> {
        self.columns.iter().map(|c| c.field_type).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.field_type)
    }

    /// Replaces the type of an existing field.
    pub fn set_type(&mut self, name: &str, field_type: FieldType) -> Result<()> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::schema_mismatch("Unknown field names", [name]))?;
        column.field_type = field_type;
        Ok(())
    }

    /// Restricts and reorders the schema to exactly `names`.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Schema> {
        let missing: Vec<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::schema_mismatch("Invalid field names", missing));
        }
        Schema::from_pairs(names.iter().map(|name| {
            let name = name.as_ref();
            (name.to_string(), self.get(name).unwrap_or(FieldType::Text))
        }))
    }

    /// Fails unless `other` has the same names and types in the same order.
    pub fn ensure_same(&self, other: &Schema) -> Result<()> {
        if self == other {
            return Ok(());
        }
        let mut differing: Vec<String> = Vec::new();
        for idx in 0..self.len().max(other.len()) {
            match (self.columns.get(idx), other.columns.get(idx)) {
                (Some(left), Some(right)) if left == right => {}
                (Some(left), Some(right)) => {
                    differing.push(left.name.clone());
                    differing.push(right.name.clone());
                }
                (Some(only), None) | (None, Some(only)) => differing.push(only.name.clone()),
                (None, None) => {}
            }
        }
        Err(Error::schema_mismatch("Tables have different fields", differing))
    }

    fn validate_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !seen.insert(*name))
            .collect();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::schema_mismatch("Duplicate field names", duplicates))
        }
    }

    pub fn to_yaml_string(&self) -> AnyResult<String> {
        let file = SchemaFile {
            schema_version: Some(CURRENT_SCHEMA_VERSION.to_string()),
            fields: self.columns.clone(),
        };
        serde_yaml::to_string(&file).context("Serializing schema to YAML string")
    }

    pub fn from_yaml_str(source: &str) -> AnyResult<Self> {
        let file: SchemaFile = serde_yaml::from_str(source).context("Parsing schema YAML")?;
        Self::from_file(file)
    }

    pub fn save(&self, path: &Path) -> AnyResult<()> {
        let file = SchemaFile {
            schema_version: Some(CURRENT_SCHEMA_VERSION.to_string()),
            fields: self.columns.clone(),
        };
        let handle = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(handle, &file).context("Writing schema YAML")
    }

    pub fn load(path: &Path) -> AnyResult<Self> {
        let handle = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(handle);
        let file: SchemaFile = serde_yaml::from_reader(reader).context("Parsing schema YAML")?;
        Self::from_file(file).with_context(|| format!("Validating schema file {path:?}"))
    }

    fn from_file(file: SchemaFile) -> AnyResult<Self> {
        let schema = Schema {
            columns: file.fields,
        };
        schema.validate_unique_names()?;
        Ok(schema)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnMeta;
    type IntoIter = std::slice::Iter<'a, ColumnMeta>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::from_pairs([
            ("a", FieldType::Integer),
            ("b", FieldType::Text),
            ("c", FieldType::Date),
        ])
        .unwrap()
    }

    #[test]
    fn push_rejects_duplicates() {
        let mut schema = sample();
        let err = schema.push("b", FieldType::Float).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate field names: \"b\"");
    }

    #[test]
    fn select_reorders_and_validates() {
        let schema = sample();
        let selected = schema.select(&["c", "a"]).unwrap();
        assert_eq!(selected.field_names(), vec!["c", "a"]);
        assert_eq!(selected.field_types(), vec![FieldType::Date, FieldType::Integer]);

        let err = schema.select(&["a", "zzz"]).unwrap_err();
        assert!(matches!(&err, Error::SchemaMismatch { names, .. } if names == &["zzz"]));
    }

    #[test]
    fn ensure_same_names_the_differing_fields() {
        let left = sample();
        let mut right = sample();
        right.set_type("b", FieldType::Float).unwrap();
        let err = left.ensure_same(&right).unwrap_err();
        assert!(matches!(&err, Error::SchemaMismatch { names, .. } if names == &["b"]));
        assert!(left.ensure_same(&sample()).is_ok());
    }

    #[test]
    fn yaml_round_trip_keeps_order() {
        let yaml = sample().to_yaml_string().unwrap();
        assert!(yaml.contains("schema_version"));
        assert!(yaml.contains("type: integer"));
        let parsed = Schema::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn yaml_rejects_duplicate_names() {
        let err = Schema::from_yaml_str(
            "fields:\n  - name: a\n    type: integer\n  - name: a\n    type: text\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate field names"));
    }
}
