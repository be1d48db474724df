//! Field-name normalization.
//!
//! External headers are folded to lowercase ASCII identifiers with words
//! joined by `_`, then made unique by suffixing `_2`, `_3`, … to repeats.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_UNIQUE_FORMAT: &str = "{name}_{index}";
const SEPARATOR: char = '_';

/// `"Query Occurrence( % )"` becomes `"query_occurrence"`; accents are
/// folded (`"Município"` → `"municipio"`) and other symbols dropped.
pub fn slug(text: &str) -> String {
    let mut slugged = String::with_capacity(text.len());
    let mut pending_separator = false;
    for ch in text.nfkd().filter(char::is_ascii) {
        if ch.is_ascii_whitespace() || ch == SEPARATOR || ch == '-' {
            pending_separator = true;
            continue;
        }
        if !ch.is_ascii_alphanumeric() {
            continue;
        }
        if pending_separator && !slugged.is_empty() {
            slugged.push(SEPARATOR);
        }
        pending_separator = false;
        slugged.push(ch.to_ascii_lowercase());
    }
    slugged
}

/// Renders `format` with `{name}` and `{index}` substituted.
fn render_unique_format(format: &str, name: &str, index: usize) -> String {
    format
        .replace("{name}", name)
        .replace("{index}", &index.to_string())
}

/// Returns `name` if it is free, otherwise the first `format` rendering
/// (index 2, 3, …) that is not in `existing_names`.
pub fn make_unique_name<S: AsRef<str>>(name: &str, existing_names: &[S], format: &str) -> String {
    let taken: HashSet<&str> = existing_names.iter().map(AsRef::as_ref).collect();
    let mut candidate = name.to_string();
    let mut index = 2usize;
    while taken.contains(candidate.as_str()) {
        candidate = render_unique_format(format, name, index);
        index += 1;
    }
    candidate
}

/// Makes every name unique, keeping first occurrences untouched:
/// `["first", "first", "first"]` → `["first", "first_2", "first_3"]`.
pub fn uniquify<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut next_index: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let unique = if used.contains(&name) {
            let index = next_index.entry(name.clone()).or_insert(2);
            loop {
                let candidate = render_unique_format(DEFAULT_UNIQUE_FORMAT, &name, *index);
                *index += 1;
                if !used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            name
        };
        used.insert(unique.clone());
        result.push(unique);
    }
    result
}

/// Normalizes a raw header row into unique identifiers. Empty names become
/// `field_<position>`; names starting with a digit get a `field_` prefix.
pub fn make_header<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let normalized = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| normalize_name(name.as_ref(), index));
    uniquify(normalized)
}

/// Normalizes a single name the way [`make_header`] does at `index`,
/// without uniquing.
pub fn normalize_name(name: &str, index: usize) -> String {
    let slugged = slug(name);
    if slugged.is_empty() {
        format!("field_{index}")
    } else if slugged.starts_with(|c: char| c.is_ascii_digit()) {
        format!("field_{slugged}")
    } else {
        slugged
    }
}
