use std::collections::HashSet;

use proptest::prelude::*;
use rowkit::{make_header, make_unique_name, uniquify};

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with('_')
        && !name.ends_with('_')
        && !name.contains("__")
}

#[test]
fn headers_become_lowercase_identifiers() {
    let header = make_header(["Query Occurrence( % )", "First Seen"]);
    assert_eq!(header, vec!["query_occurrence", "first_seen"]);
    assert!(header.iter().all(|name| is_identifier(name)));
}

#[test]
fn repeated_headers_get_numeric_suffixes() {
    assert_eq!(
        make_header(["first", "first", "first"]),
        vec!["first", "first_2", "first_3"]
    );
    assert_eq!(
        make_header(["Name", "name", "NAME "]),
        vec!["name", "name_2", "name_3"]
    );
}

#[test]
fn unique_name_skips_taken_suffixes() {
    let existing = ["total", "total_2"];
    assert_eq!(make_unique_name("total", &existing, "{name}_{index}"), "total_3");
    assert_eq!(make_unique_name("total", &existing, "{index}-{name}"), "2-total");
}

#[test]
fn uniquify_leaves_distinct_names_alone() {
    assert_eq!(uniquify(["a", "b", "c"]), vec!["a", "b", "c"]);
}

proptest! {
    #[test]
    fn make_header_is_unique_and_well_formed(names in proptest::collection::vec("[ -~À-ÿ]{0,12}", 0..16)) {
        let header = make_header(&names);
        prop_assert_eq!(header.len(), names.len());
        let distinct: HashSet<&String> = header.iter().collect();
        prop_assert_eq!(distinct.len(), header.len());
        for name in &header {
            prop_assert!(is_identifier(name), "{:?} is not an identifier", name);
        }
    }

    #[test]
    fn make_header_is_idempotent(names in proptest::collection::vec("[a-zA-Z ]{1,8}", 1..10)) {
        let once = make_header(&names);
        prop_assert_eq!(make_header(&once), once);
    }
}
