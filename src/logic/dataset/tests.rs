use super::*;
use std::io::Write;
use tempfile::tempdir;

fn sample_table() -> Table {
    Table::new(vec![
        Column::numeric("duration", vec![0.0, 1.0, 2.0]),
        Column::text("protocol_type", &["tcp", "udp", "icmp"]),
        Column::text("class", &["normal", "anomaly", "normal"]),
    ])
    .unwrap()
}

#[test]
fn test_load_csv_types_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "duration,protocol_type,src_bytes,class").unwrap();
    writeln!(file, "0,tcp,491,normal").unwrap();
    writeln!(file, "2,udp,146.5,anomaly").unwrap();
    drop(file);

    let table = load_csv(&path).unwrap();
    assert_eq!(table.n_rows(), 2);
    assert_eq!(table.column_names(), vec!["duration", "protocol_type", "src_bytes", "class"]);
    assert_eq!(table.categorical_columns(), vec!["protocol_type", "class"]);
    assert_eq!(
        table.column("src_bytes").unwrap().data,
        ColumnData::Numeric(vec![491.0, 146.5])
    );
}

#[test]
fn test_load_csv_missing_file() {
    let dir = tempdir().unwrap();
    let err = load_csv(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, DetectError::InputNotFound(_)));
}

#[test]
fn test_table_rejects_ragged_columns() {
    let result = Table::new(vec![
        Column::numeric("a", vec![1.0, 2.0]),
        Column::numeric("b", vec![1.0]),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_target_column_prefers_class() {
    assert_eq!(sample_table().target_column().as_deref(), Some("class"));

    let table = Table::new(vec![
        Column::numeric("a", vec![1.0]),
        Column::text("label", &["x"]),
    ])
    .unwrap();
    assert_eq!(table.target_column().as_deref(), Some("label"));
}

#[test]
fn test_split_target() {
    let (features, labels) = sample_table().split_target("class").unwrap();
    assert_eq!(labels, vec!["normal", "anomaly", "normal"]);
    assert_eq!(features.column_names(), vec!["duration", "protocol_type"]);
    assert!(sample_table().split_target("missing").is_err());
}

#[test]
fn test_numeric_labels_render_as_strings() {
    let table = Table::new(vec![
        Column::numeric("a", vec![1.0, 2.0]),
        Column::numeric("target", vec![0.0, 1.0]),
    ])
    .unwrap();
    let (_, labels) = table.split_target("target").unwrap();
    assert_eq!(labels, vec!["0", "1"]);
}

#[test]
fn test_take_rows_and_record() {
    let table = sample_table().take_rows(&[2, 0]);
    assert_eq!(table.n_rows(), 2);

    let record = table.record(0).unwrap();
    assert_eq!(record["duration"], FeatureValue::Number(2.0));
    assert_eq!(record["protocol_type"], FeatureValue::Text("icmp".into()));
    assert!(table.record(2).is_none());
}
