use anyhow::Result;
use std::fs;
use tfshard::testing::{feature_of, read_shard_examples, write_csv_fixture};
use tfshard::{ConversionConfig, FeatureValue, FieldKind, convert_csv};

#[test]
fn loads_json_file_with_mappings() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg_path = tmp.path().join("cfg.json");
    fs::write(
        &cfg_path,
        r#"{
            "headers": ["city", "temp", "flag"],
            "floats": ["temp"],
            "integers": ["flag"],
            "categoricals": ["city"],
            "mappings": {
                "temp": {"kind": "replace", "from": ",", "to": "."},
                "flag": {"kind": "lookup", "table": {"yes": "1", "no": "0"}},
                "city": {"kind": "lowercase"}
            },
            "filesize": 5000
        }"#,
    )?;
    let cfg = ConversionConfig::from_json_file(&cfg_path)?;
    assert_eq!(cfg.filesize, 5000);
    let schema = cfg.schema()?;
    assert_eq!(schema.kind_of_field("temp"), FieldKind::Float);

    let csv = write_csv_fixture(
        tmp.path(),
        "in.csv",
        "city,temp,flag\nOSLO,\"-3,5\",yes\nRome,21,maybe\n",
    )?;
    let summary = convert_csv(&csv, tmp.path().join("w.tfrecords"), &cfg)?;
    let ex = read_shard_examples(&summary.shards[0].path)?;
    assert_eq!(feature_of(&ex[0], "city"), Some(FeatureValue::Bytes(b"oslo".to_vec())));
    assert_eq!(feature_of(&ex[0], "temp"), Some(FeatureValue::Float(-3.5)));
    assert_eq!(feature_of(&ex[0], "flag"), Some(FeatureValue::Int64(1)));
    // Lookup miss without a default leaves the feature empty.
    assert_eq!(feature_of(&ex[1], "flag"), Some(FeatureValue::Absent));
    Ok(())
}

#[test]
fn config_errors_happen_before_output_exists() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let csv = write_csv_fixture(tmp.path(), "in.csv", "a\n1\n")?;
    let cfg = ConversionConfig::new(Vec::<String>::new());
    assert!(convert_csv(&csv, tmp.path().join("x.tfrecords"), &cfg).is_err());
    assert!(!tmp.path().join("x_1.tfrecords").exists());
    Ok(())
}

#[test]
fn unreadable_config_file_is_an_error() {
    assert!(ConversionConfig::from_json_file("no/such/config.json").is_err());
}

#[test]
fn skip_header_false_encodes_first_line() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let csv = write_csv_fixture(tmp.path(), "in.csv", "5\n6\n")?;
    let cfg = ConversionConfig::new(["n"]).with_integers(["n"]).with_skip_header(false);
    let summary = convert_csv(&csv, tmp.path().join("n.tfrecords"), &cfg)?;
    assert_eq!(summary.records_written, 2);
    Ok(())
}
