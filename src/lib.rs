//! Typed tabular rows.
//!
//! `rowkit` turns rows of untyped cells into a [`Table`] with a declared
//! column [`Schema`]. Column types are either supplied or inferred from a
//! sample of the data by elimination over the ordered [`FieldType`]
//! registry; every appended row is then coerced through its column's type.
//! Numeric parsing and formatting can be switched to a locale's separators
//! for the extent of a [`locale_scope`].

pub mod builder;
pub mod error;
pub mod fields;
pub mod header;
pub mod inference;
pub mod locale;
mod numeric;
pub mod schema;
pub mod table;
pub mod value;

pub use builder::{TableOptions, create_table};
pub use error::{Error, Result, TypeMismatch};
pub use fields::{FieldOptions, FieldType, LocaleMode, all_types, available_types, by_canonical_name};
pub use header::{make_header, make_unique_name, slug, uniquify};
pub use inference::{DetectionConfig, detect_types};
pub use locale::{LocaleGuard, LocaleRegistry, NumericLocale, locale_scope, with_locale};
pub use schema::Schema;
pub use table::{Meta, Record, Table};
pub use value::{IntoCell, Value};
