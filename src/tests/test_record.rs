use crate::codec::record::{extract_record, extract_record_from_node};
use crate::dictionary::ValueDicts;
use crate::schema::{RecordField, RecordLayout};
use crate::{Envelope, Value};
use chrono::NaiveDate;
use serde_json::json;

fn layout() -> RecordLayout {
    RecordLayout::new(vec![
        RecordField::new("G0", "Number"),
        RecordField::new("G1", "Version"),
        RecordField::new("G2", "Unlisted"),
        RecordField::date("G5", "Issued", 4),
        RecordField::date("G6", "ValidTo", 5),
        RecordField::new("G7", "Program"),
        RecordField::new("G8", "Standards"),
    ])
    .unwrap()
}

fn certificate_node() -> serde_json::Value {
    json!({
        "S": [
            { "N": "G0", "T": 1, "DN": "D0" },
            { "N": "G1", "T": 1, "DN": "D1" },
            { "N": "G5", "T": 7 },
            { "N": "G6", "T": 7 },
            { "N": "G7", "T": 1, "DN": "D5" },
            { "N": "G8", "T": 1, "DN": "D6" }
        ],
        "G0": 1,
        "G1": 9,
        "C": [1, 9, 0, 0, 1_700_000_000_000i64, 0]
    })
}

fn envelope(roots: serde_json::Value) -> Envelope {
    Envelope::from_value(json!({
        "ValueDicts": {
            "D0": ["CU-000", "CU-123"],
            "D1": ["1.0"],
            "D5": ["Organic Content Standard", "Recycled Claim Standard"],
            "D6": []
        },
        "PH": [ { "DM0": roots } ]
    }))
}

#[test]
fn resolves_dictionary_date_and_missing_fields() {
    let env = envelope(json!([certificate_node()]));
    let record = extract_record(&env, &layout()).unwrap();

    assert_eq!(record.len(), 7);
    assert_eq!(record.get("Number"), Some(&Value::from("CU-123")));
    // Index present but out of range: first dictionary entry.
    assert_eq!(record.get("Version"), Some(&Value::from("1.0")));
    // No schema entry names G2.
    assert_eq!(record.get("Unlisted"), Some(&Value::Null));
    assert_eq!(
        record.get("Issued"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()))
    );
    // Zero timestamp.
    assert_eq!(record.get("ValidTo"), Some(&Value::Null));
    // Index absent on the node: first dictionary entry.
    assert_eq!(
        record.get("Program"),
        Some(&Value::from("Organic Content Standard"))
    );
    // Empty dictionary.
    assert_eq!(record.get("Standards"), Some(&Value::Null));
}

#[test]
fn unusable_index_falls_back_to_first_entry() {
    let raw = json!({ "D1": ["1.0", "2.0"] });
    let dicts = ValueDicts::new(raw.as_object().unwrap());
    let layout = RecordLayout::new(vec![RecordField::new("G1", "Version")]).unwrap();

    for index in [json!(9), json!(-1), json!("1"), json!(1.5), json!(null)] {
        let node = json!({ "S": [ { "N": "G1", "DN": "D1" } ], "G1": index });
        let record = extract_record_from_node(&dicts, &layout, &node);
        assert_eq!(record.get("Version"), Some(&Value::from("1.0")), "index {index}");
    }

    let node = json!({ "S": [ { "N": "G1", "DN": "D1" } ], "G1": 1 });
    let record = extract_record_from_node(&dicts, &layout, &node);
    assert_eq!(record.get("Version"), Some(&Value::from("2.0")));

    let node = json!({ "S": [ { "N": "G1", "DN": "D9" } ], "G1": 0 });
    let record = extract_record_from_node(&dicts, &layout, &node);
    assert_eq!(record.get("Version"), Some(&Value::Null));
}

#[test]
fn record_keeps_layout_column_order() {
    let env = envelope(json!([certificate_node()]));
    let record = extract_record(&env, &layout()).unwrap();
    assert_eq!(record.columns(), layout().columns().as_slice());
}

#[test]
fn date_tag_without_slot_is_null() {
    let layout = RecordLayout::new(vec![RecordField::new("G5", "Issued")]).unwrap();
    let env = envelope(json!([certificate_node()]));
    let record = extract_record(&env, &layout).unwrap();
    assert_eq!(record.get("Issued"), Some(&Value::Null));
}

#[test]
fn later_matching_entry_can_resolve() {
    let node = json!({
        "S": [ { "N": "G0", "T": 1 }, { "N": "G0", "T": 1, "DN": "D0" } ],
        "G0": 0
    });
    let raw = json!({ "D0": ["first"] });
    let dicts = ValueDicts::new(raw.as_object().unwrap());
    let layout = RecordLayout::new(vec![RecordField::new("G0", "Number")]).unwrap();
    let record = extract_record_from_node(&dicts, &layout, &node);
    assert_eq!(record.get("Number"), Some(&Value::from("first")));
}

#[test]
fn first_root_wins() {
    let mut second = certificate_node();
    second["G0"] = json!(0);
    let env = envelope(json!([certificate_node(), second]));
    let record = extract_record(&env, &layout()).unwrap();
    assert_eq!(record.get("Number"), Some(&Value::from("CU-123")));
}

#[test]
fn no_root_means_no_record() {
    assert!(extract_record(&envelope(json!([])), &layout()).is_none());
    assert!(extract_record(&Envelope::from_value(json!({})), &layout()).is_none());
}

#[test]
fn node_without_schema_yields_all_null_record() {
    let env = envelope(json!([ { "G0": 1 } ]));
    let record = extract_record(&env, &layout()).unwrap();
    assert_eq!(record.len(), 7);
    assert!(record.values().iter().all(Value::is_null));
}

#[test]
fn record_serializes_as_object() {
    let env = envelope(json!([certificate_node()]));
    let record = extract_record(&env, &layout()).unwrap();
    let v = serde_json::to_value(&record).unwrap();
    assert_eq!(v["Number"], json!("CU-123"));
    assert_eq!(v["Issued"], json!("2023-11-14"));
    assert_eq!(v["Version"], json!(null));
}
