use tfshard::{FeatureValue, FieldTransform, Schema, encode_row};

fn schema() -> Schema {
    Schema::builder(["f", "i", "c", "skip"])
        .floats(["f"])
        .integers(["i"])
        .categoricals(["c"])
        .build()
        .unwrap()
}

#[test]
fn parseable_values_keep_their_type() {
    let rec = encode_row(&["1e3", "-12", "red", "zzz"], &schema());
    assert_eq!(rec.get("f"), Some(&FeatureValue::Float(1000.0)));
    assert_eq!(rec.get("i"), Some(&FeatureValue::Int64(-12)));
    assert_eq!(rec.get("c"), Some(&FeatureValue::Bytes(b"red".to_vec())));
}

#[test]
fn unclassified_fields_never_appear() {
    for row in [
        ["1", "2", "x", "y"],
        ["", "", "", ""],
        ["nan", "9999999999999999999999", "q", "1"],
    ] {
        let rec = encode_row(&row, &schema());
        assert!(!rec.contains("skip"));
        assert_eq!(rec.len(), 3);
    }
}

#[test]
fn unparseable_numbers_are_absent_not_zero() {
    let rec = encode_row(&["", "4.2", "c", ""], &schema());
    assert_eq!(rec.get("f"), Some(&FeatureValue::Absent));
    assert_eq!(rec.get("i"), Some(&FeatureValue::Absent));

    // i64 overflow cannot be represented and is treated the same way.
    let rec = encode_row(&["0", "9999999999999999999999", "c", ""], &schema());
    assert_eq!(rec.get("f"), Some(&FeatureValue::Float(0.0)));
    assert_eq!(rec.get("i"), Some(&FeatureValue::Absent));
}

#[test]
fn overlapping_sets_follow_precedence() {
    let schema = Schema::builder(["v"])
        .categoricals(["v"])
        .integers(["v"])
        .floats(["v"])
        .build()
        .unwrap();
    assert_eq!(encode_row(&["7"], &schema).get("v"), Some(&FeatureValue::Float(7.0)));

    let schema = Schema::builder(["v"])
        .categoricals(["v"])
        .integers(["v"])
        .build()
        .unwrap();
    assert_eq!(encode_row(&["7"], &schema).get("v"), Some(&FeatureValue::Int64(7)));
    // An integer field never falls back to categorical on a parse failure.
    assert_eq!(encode_row(&["seven"], &schema).get("v"), Some(&FeatureValue::Absent));
}

#[test]
fn no_transform_means_raw_value() {
    let with_identity = Schema::builder(["c", "i"])
        .categoricals(["c"])
        .integers(["i"])
        .transform("c", FieldTransform::Identity)
        .transform("i", FieldTransform::Identity)
        .build()
        .unwrap();
    let without = Schema::builder(["c", "i"])
        .categoricals(["c"])
        .integers(["i"])
        .build()
        .unwrap();
    let row = ["Mixed Case", "5"];
    assert_eq!(encode_row(&row, &with_identity), encode_row(&row, &without));
    assert_eq!(
        encode_row(&row, &without).get("c"),
        Some(&FeatureValue::Bytes(b"Mixed Case".to_vec()))
    );
}

#[test]
fn categorical_empty_after_transform_is_absent() {
    let schema = Schema::builder(["c"])
        .categoricals(["c"])
        .transform("c", FieldTransform::Trim)
        .build()
        .unwrap();
    assert_eq!(encode_row(&["   "], &schema).get("c"), Some(&FeatureValue::Absent));
    assert_eq!(
        encode_row(&[" a "], &schema).get("c"),
        Some(&FeatureValue::Bytes(b"a".to_vec()))
    );
}

#[test]
fn extra_cells_are_ignored() {
    let rec = encode_row(&["1.5", "2", "x", "y", "extra", "more"], &schema());
    assert_eq!(rec.len(), 3);
    assert_eq!(rec.get("f"), Some(&FeatureValue::Float(1.5)));
}
