mod common;

use std::cell::Cell;

use rowkit::{
    Error, FieldOptions, FieldType, Meta, Schema, TableOptions, Value, create_table, locale_scope,
};
use rust_decimal::Decimal;

use common::{rows, table_from};

#[test]
fn infers_schema_from_header_and_rows() {
    let table = table_from(&[
        &["Name", "Age", "Score", "Joined", "Active", "Share"],
        &["alice", "30", "9.5", "2020-01-01", "yes", "10%"],
        &["bob", "-", "7", "2021-06-15", "no", "12.5%"],
    ]);
    assert_eq!(
        table.field_names(),
        vec!["name", "age", "score", "joined", "active", "share"]
    );
    assert_eq!(
        table.field_types(),
        vec![
            FieldType::Text,
            FieldType::Integer,
            FieldType::Float,
            FieldType::Date,
            FieldType::Boolean,
            FieldType::Percentage,
        ]
    );
    assert_eq!(table.len(), 2);
    let bob = table.get(1).unwrap();
    assert_eq!(bob.get("age"), None);
    assert_eq!(bob.get("score"), Some(&Value::Float(7.0)));
    assert_eq!(bob.get("share"), Some(&Value::Decimal(Decimal::new(125, 3))));
}

#[test]
fn empty_source_gives_empty_table() {
    let table = create_table(Vec::<Vec<&str>>::new(), &TableOptions::new()).unwrap();
    assert!(table.fields().is_empty());
    assert!(table.is_empty());

    let header_only = table_from(&[&["a", "b"]]);
    assert_eq!(header_only.field_types(), vec![FieldType::Text, FieldType::Text]);
}

#[test]
fn all_null_columns_become_binary() {
    let table = table_from(&[&["id", "notes"], &["1", ""], &["2", "null"]]);
    assert_eq!(table.fields().get("notes"), Some(FieldType::Binary));
    assert_eq!(table[0][1], None);
}

#[test]
fn explicit_schema_skips_or_keeps_first_row() {
    let schema = Schema::from_pairs([("N", FieldType::Integer)]).unwrap();
    let data = rows(&[&["1"], &["2"]]);

    let skipped = create_table(data.clone(), &TableOptions::new().fields(schema.clone())).unwrap();
    assert_eq!(skipped.field_names(), vec!["n"]);
    assert_eq!(skipped.len(), 1);

    let kept = create_table(
        data,
        &TableOptions::new().fields(schema).skip_header(false),
    )
    .unwrap();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0][0], Some(Value::Integer(1)));
}

#[test]
fn appending_a_bad_value_fails_and_keeps_length() {
    let schema = Schema::from_pairs([("n", FieldType::Integer)]).unwrap();
    let mut table = create_table(
        rows(&[&["n"], &["1"]]),
        &TableOptions::new().fields(schema),
    )
    .unwrap();
    let err = table.append_record([("n", "not-a-number")]).unwrap_err();
    assert!(err.as_type_mismatch().is_some());
    assert_eq!(table.len(), 1);
}

#[test]
fn values_beyond_the_sample_fail_loudly() {
    let err = create_table(
        rows(&[&["n"], &["1"], &["2"], &["three"]]),
        &TableOptions::new().samples(2),
    )
    .unwrap_err();
    let mismatch = err.as_type_mismatch().expect("type mismatch");
    assert_eq!(mismatch.field_type, FieldType::Integer);
    assert_eq!(mismatch.field.as_deref(), Some("n"));
    assert_eq!(mismatch.row, Some(2));
    assert_eq!(mismatch.value, "three");
}

#[test]
fn force_types_win_and_are_checked_lazily() {
    let table = create_table(
        rows(&[&["Zip Code", "n"], &["01234", "1"], &["98765", "2"]]),
        &TableOptions::new().force_type("Zip Code", FieldType::Text),
    )
    .unwrap();
    assert_eq!(table.fields().get("zip_code"), Some(FieldType::Text));
    assert_eq!(table[0][0], Some(Value::from("01234")));

    let err = create_table(
        rows(&[&["n"], &["x"]]),
        &TableOptions::new().force_type("n", FieldType::Integer),
    )
    .unwrap_err();
    assert!(err.as_type_mismatch().is_some());

    let err = create_table(
        rows(&[&["n"], &["1"]]),
        &TableOptions::new().force_type("missing", FieldType::Integer),
    )
    .unwrap_err();
    assert!(matches!(&err, Error::SchemaMismatch { names, .. } if names == &["missing"]));
}

#[test]
fn force_types_override_explicit_fields() {
    let schema = Schema::from_pairs([("code", FieldType::Integer)]).unwrap();
    let table = create_table(
        rows(&[&["code"], &["007"]]),
        &TableOptions::new()
            .fields(schema)
            .force_type("Code", FieldType::Text),
    )
    .unwrap();
    assert_eq!(table.field_types(), vec![FieldType::Text]);
    assert_eq!(table[0][0], Some(Value::from("007")));
}

#[test]
fn import_fields_restrict_and_reorder() {
    let data = rows(&[&["a", "b", "c"], &["1", "x", "2020-01-01"], &["2", "y", "2020-01-02"]]);
    let table = create_table(data.clone(), &TableOptions::new().import_fields(["c", "a"])).unwrap();
    assert_eq!(table.field_names(), vec!["c", "a"]);
    assert_eq!(table.field_types(), vec![FieldType::Date, FieldType::Integer]);
    assert_eq!(table[1][1], Some(Value::Integer(2)));

    let err = create_table(data, &TableOptions::new().import_fields(["c", "nope"])).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert!(err.to_string().contains("\"nope\""));
}

#[test]
fn import_fields_skip_detection_of_dropped_columns() {
    let table = create_table(
        rows(&[&["a", "b"], &["1", "x"]]),
        &TableOptions::new().import_fields(["a"]),
    )
    .unwrap();
    assert_eq!(table.field_names(), vec!["a"]);
    assert_eq!(table.len(), 1);
}

#[test]
fn ragged_rows_pad_or_fail() {
    let table = table_from(&[&["a", "b"], &["10", "20"], &["30"]]);
    assert_eq!(table[1][0], Some(Value::Integer(30)));
    assert_eq!(table[1][1], None);

    let err = create_table(
        rows(&[&["a", "b"], &["1", "2"], &["3", "4", "5"]]),
        &TableOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::RowLength {
            row: 1,
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn max_rows_limits_import() {
    let data = rows(&[&["n"], &["1"], &["2"], &["x"]]);
    let table = create_table(data, &TableOptions::new().max_rows(2)).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.field_types(), vec![FieldType::Integer]);
}

#[test]
fn sampling_pulls_each_source_row_once() {
    let pulled = Cell::new(0usize);
    let source = (0..100).map(|idx| {
        pulled.set(pulled.get() + 1);
        if idx == 0 {
            vec!["n".to_string()]
        } else {
            vec![idx.to_string()]
        }
    });
    let table = create_table(source, &TableOptions::new().samples(5)).unwrap();
    assert_eq!(table.len(), 99);
    assert_eq!(table[0][0], Some(Value::Integer(1)));
    assert_eq!(table[98][0], Some(Value::Integer(99)));
    assert_eq!(pulled.get(), 100);
}

#[test]
fn meta_is_carried_through() {
    let mut meta = Meta::new();
    meta.insert("filename".into(), serde_json::json!("exports/people.csv"));
    let table = create_table(rows(&[&["a"], &["1"]]), &TableOptions::new().meta(meta)).unwrap();
    assert_eq!(table.name().as_deref(), Some("people"));
}

#[test]
fn locale_scope_applies_to_import() {
    let data = rows(&[&["amount"], &["1.234,50"], &["99,90"]]);
    let table = {
        let _guard = locale_scope("pt_BR.UTF-8").unwrap();
        create_table(data.clone(), &TableOptions::new()).unwrap()
    };
    assert_eq!(table.field_types(), vec![FieldType::Float]);
    assert_eq!(table[0][0], Some(Value::Float(1234.5)));

    let naive = create_table(
        data,
        &TableOptions::new().field_options(FieldOptions::new().naive()),
    )
    .unwrap();
    assert_eq!(naive.field_types(), vec![FieldType::Text]);
}

#[test]
fn native_cells_are_accepted() {
    let data = vec![
        vec![Some(Value::from("when")), Some(Value::from("count"))],
        vec![Some(Value::from("2024-01-01")), Some(Value::Integer(3))],
        vec![None, Some(Value::Integer(4))],
    ];
    let table = create_table(data, &TableOptions::new()).unwrap();
    assert_eq!(table.field_types(), vec![FieldType::Date, FieldType::Integer]);
    assert_eq!(table[1][0], None);
}
