//! End-to-end scenarios over the in-memory sort + condense pipeline.

use condense_core::condense::Condenser;
use condense_core::config::{FieldRules, MissingKeyPolicy};
use condense_core::io::reader::read_records;
use condense_core::pipeline::sort_and_condense;
use condense_core::record::Record;
use condense_core::sort::sort_by_cluster_key;
use condense_core::timing::StageTimings;

fn rules() -> FieldRules {
    FieldRules::default()
}

fn condense_all(records: Vec<Record<i64>>) -> Vec<condense_core::Aggregate> {
    let condenser = Condenser::new(rules());
    sort_and_condense(records, &condenser, &mut StageTimings::default())
}

#[test]
fn unsorted_clusters_collapse_in_key_order() {
    let input = vec![
        Record::new(Some(2)).with("FULL_NAME", "B"),
        Record::new(Some(1)).with("FULL_NAME", "A"),
        Record::new(Some(1)).with("FULL_NAME", "A2"),
    ];

    let sorted = sort_by_cluster_key(input.clone());
    let keys: Vec<Option<i64>> = sorted.iter().map(|r| r.cluster_key).collect();
    assert_eq!(keys, [Some(1), Some(1), Some(2)]);
    assert_eq!(sorted[0].get("FULL_NAME"), Some("A"));
    assert_eq!(sorted[1].get("FULL_NAME"), Some("A2"));

    let out = condense_all(input);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get("FULL_NAME"), Some("A; A2"));
    assert_eq!(out[1].get("FULL_NAME"), Some("B"));
}

#[test]
fn email_values_are_unioned_once() {
    let input = ["a@x.com", "a@x.com", "b@x.com"]
        .into_iter()
        .map(|email| Record::new(Some(9)).with("EMAIL", email))
        .collect();

    let out = condense_all(input);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get("EMAIL"), Some("a@x.com; b@x.com"));
}

#[test]
fn singleton_keeps_its_values_without_separators() {
    let input = vec![
        Record::new(Some(3))
            .with("ID", "1")
            .with("FULL_NAME", "Dr. Quinn")
            .with("EMAIL", "q@x.com")
            .with("SOURCE", "fox"),
    ];

    let out = condense_all(input);
    assert_eq!(out[0].get("FULL_NAME"), Some("Dr. Quinn"));
    assert_eq!(out[0].get("EMAIL"), Some("q@x.com"));
    assert_eq!(out[0].get("SOURCE"), Some("fox"));
}

#[test]
fn empty_input_condenses_to_nothing() {
    assert!(condense_all(Vec::new()).is_empty());
}

#[test]
fn identity_fields_are_dropped_from_every_aggregate() {
    let input = vec![
        Record::new(Some(1))
            .with("ID", "10")
            .with("ADDRESS_1", "1 Main St")
            .with("ADDRESS_2", "Suite 4")
            .with("CITY", "Reno")
            .with("STATE", "NV")
            .with("ZIPCODE", "89501")
            .with("PHONE", "555-0100")
            .with("FULL_NAME", "A")
            .with("SPECIALTY", "Cardiology"),
        Record::new(Some(1)).with("ID", "11").with("CITY", "Elko"),
    ];

    let out = condense_all(input);
    let discard = rules().discard;
    for aggregate in &out {
        for name in &discard {
            assert!(!aggregate.fields.contains_key(name), "{name} leaked");
        }
    }
    assert_eq!(out[0].get("SPECIALTY"), Some("Cardiology"));
}

#[test]
fn all_mergeable_fields_are_merged() {
    let rules = rules();
    let first = rules
        .merge
        .iter()
        .fold(Record::new(Some(1)), |r, f| r.with(f.as_str(), "one"));
    let second = rules
        .merge
        .iter()
        .fold(Record::new(Some(1)), |r, f| r.with(f.as_str(), "two"));

    let out = condense_all(vec![first, second]);
    for field in &rules.merge {
        assert_eq!(out[0].get(field), Some("one; two"), "field {field}");
    }
}

#[test]
fn keyless_rows_trail_the_keyed_clusters() {
    let input = vec![
        Record::new(None).with("FULL_NAME", "X"),
        Record::new(Some(5)).with("FULL_NAME", "E"),
        Record::new(None).with("FULL_NAME", "Y"),
    ];

    let out = condense_all(input.clone());
    let names: Vec<Option<&str>> = out.iter().map(|a| a.get("FULL_NAME")).collect();
    assert_eq!(names, [Some("E"), Some("X"), Some("Y")]);

    let grouped = Condenser::new(FieldRules {
        missing_key: MissingKeyPolicy::Group,
        ..rules()
    });
    let out = sort_and_condense(input, &grouped, &mut StageTimings::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].get("FULL_NAME"), Some("X; Y"));
}

#[test]
fn unrelated_keyless_providers_are_not_merged() {
    let csv = "\
ID,Cluster ID,FULL_NAME,EMAIL
1,,Alice,alice@x.com
2,,Bob,bob@x.com
3,7,Carl,carl@x.com
";
    let records = read_records(csv.as_bytes(), &rules()).expect("read csv");
    let out = condense_all(records);

    let names: Vec<Option<&str>> = out.iter().map(|a| a.get("FULL_NAME")).collect();
    assert_eq!(names, [Some("Carl"), Some("Alice"), Some("Bob")]);
    assert_eq!(out[1].get("EMAIL"), Some("alice@x.com"));
}

#[test]
fn later_duplicates_are_not_collapsed() {
    // Dedup only guards the first value seen in a cluster.
    let input = ["A", "B", "C", "B", "A"]
        .into_iter()
        .map(|name| Record::new(Some(1)).with("FULL_NAME", name))
        .collect();

    let out = condense_all(input);
    assert_eq!(out[0].get("FULL_NAME"), Some("A; B; C; B"));
}
