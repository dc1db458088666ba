//! Preprocessing contract tests: the same record must encode the same way at
//! training time and at serving time.

use super::*;
use crate::logic::dataset::Column;
use crate::models::FeatureValue;

fn layout() -> FeatureLayout {
    FeatureLayout::new(
        vec!["duration".into(), "protocol_type".into(), "flag".into()],
        vec!["protocol_type".into(), "flag".into()],
    )
}

fn train_table() -> Table {
    Table::new(vec![
        Column::numeric("duration", vec![0.0, 5.0, 9.0]),
        Column::text("protocol_type", &["tcp", "udp", "tcp"]),
        Column::text("flag", &["SF", "S0", "SF"]),
    ])
    .unwrap()
}

fn held_out_table() -> Table {
    Table::new(vec![
        Column::numeric("duration", vec![3.0]),
        Column::text("protocol_type", &["icmp"]),
        Column::text("flag", &["REJ"]),
    ])
    .unwrap()
}

fn record(duration: f64, protocol: &str, flag: &str) -> FeatureRecord {
    let mut record = FeatureRecord::new();
    record.insert("duration".into(), FeatureValue::Number(duration));
    record.insert("protocol_type".into(), FeatureValue::Text(protocol.into()));
    record.insert("flag".into(), FeatureValue::Text(flag.into()));
    record
}

#[test]
fn test_pooled_fit_covers_held_out_categories() {
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout()).unwrap();
    assert_eq!(registry.get("protocol_type").unwrap().classes(), &["icmp", "tcp", "udp"]);
    assert_eq!(registry.get("flag").unwrap().classes(), &["REJ", "S0", "SF"]);

    // Held-out split encodes strictly without unknowns
    assert!(encode_table(&held_out_table(), &layout(), &registry).is_ok());
}

#[test]
fn test_encode_table_matches_encode_record() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();
    let x = encode_table(&train_table(), &layout, &registry).unwrap();

    assert_eq!(x.shape(), &[3, 3]);
    let row = encode_record(&record(5.0, "udp", "S0"), &layout, &registry).unwrap();
    assert_eq!(row, x.row(1).to_vec());
    assert_eq!(row, vec![5.0, 2.0, 1.0]);
}

#[test]
fn test_encode_record_unknown_category_falls_back() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();
    let row = encode_record(&record(1.0, "sctp", "OTH"), &layout, &registry).unwrap();
    assert_eq!(row, vec![1.0, 0.0, 0.0]);
}

#[test]
fn test_encode_record_missing_column() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();
    let mut incomplete = record(1.0, "tcp", "SF");
    incomplete.remove("flag");

    let err = encode_record(&incomplete, &layout, &registry).unwrap_err();
    assert!(matches!(err, DetectError::MissingFeature(ref name) if name == "flag"));
}

#[test]
fn test_encode_record_ignores_extra_and_orders_columns() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();
    let mut extended = record(9.0, "tcp", "SF");
    extended.insert("class".into(), FeatureValue::Text("normal".into()));
    extended.insert("aaa_first".into(), FeatureValue::Number(1.0));

    let row = encode_record(&extended, &layout, &registry).unwrap();
    assert_eq!(row, vec![9.0, 1.0, 2.0]);
}

#[test]
fn test_encode_record_numeric_text_and_garbage() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();

    let mut as_text = record(0.0, "tcp", "SF");
    as_text.insert("duration".into(), FeatureValue::Text("12".into()));
    assert_eq!(encode_record(&as_text, &layout, &registry).unwrap()[0], 12.0);

    as_text.insert("duration".into(), FeatureValue::Text("long".into()));
    assert!(matches!(
        encode_record(&as_text, &layout, &registry),
        Err(DetectError::InvalidFeature { .. })
    ));
}

#[test]
fn test_encode_record_rejects_non_finite_numbers() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();

    for bad in [
        FeatureValue::Text("nan".into()),
        FeatureValue::Text("inf".into()),
        FeatureValue::Text("-inf".into()),
        FeatureValue::Missing,
    ] {
        let mut rec = record(0.0, "tcp", "SF");
        rec.insert("duration".into(), bad.clone());
        assert!(
            matches!(
                encode_record(&rec, &layout, &registry),
                Err(DetectError::InvalidFeature { ref feature, .. }) if feature == "duration"
            ),
            "{:?} was accepted",
            bad
        );
    }
}

#[test]
fn test_encode_record_null_category_falls_back() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();

    let mut rec = record(5.0, "udp", "S0");
    rec.insert("flag".into(), FeatureValue::Missing);
    let row = encode_record(&rec, &layout, &registry).unwrap();
    assert_eq!(row[2], 0.0);
}

#[test]
fn test_encode_table_rejects_missing_numeric_cell() {
    let layout = layout();
    let registry = fit_encoders(&train_table(), &held_out_table(), &layout).unwrap();
    let table = Table::new(vec![
        Column::numeric("duration", vec![1.0, f64::NAN]),
        Column::text("protocol_type", &["tcp", "udp"]),
        Column::text("flag", &["SF", "S0"]),
    ])
    .unwrap();

    let err = encode_table(&table, &layout, &registry).unwrap_err();
    assert!(err.to_string().contains("duration"));
    assert!(err.to_string().contains("row 2"));
}
