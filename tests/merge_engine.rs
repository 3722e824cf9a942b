use std::fs;
use std::path::{Path, PathBuf};

use perans_prep::merge::{discover_shards, merge, merge_with_progress, Diagnostic};
use perans_prep::{Category, PrepError};
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_shard(dir: &Path, name: &str, body: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(body).unwrap()).unwrap();
    path
}

fn record(uri: &str, cause: &[&str]) -> Value {
    json!({"uri": uri, "spans": {"CAUSE": cause}, "summaries": {}})
}

#[test]
fn lower_index_shard_wins_duplicate() {
    let tmp = TempDir::new().unwrap();
    write_shard(tmp.path(), "output_2.json", &json!([record("5", &[])]));
    write_shard(tmp.path(), "output_1.json", &json!([record("5", &["x"])]));

    let shards = discover_shards(tmp.path()).unwrap();
    let outcome = merge(&shards);

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].uri, 5);
    assert_eq!(outcome.records[0].spans.cause, vec!["x".to_string()]);
    assert_eq!(outcome.duplicates_skipped, 1);

    assert_eq!(outcome.diagnostics.len(), 1);
    match &outcome.diagnostics[0] {
        Diagnostic::Duplicate(d) => {
            assert_eq!(d.file, "output_2.json");
            assert_eq!(d.kept_file, "output_1.json");
            assert!(!d.identical);
            assert!(d.discarded.spans.cause.is_empty());
        }
        other => panic!("unexpected diagnostic {other}"),
    }
    let text = outcome.diagnostics[0].to_string();
    assert!(text.contains("Skipping duplicate URI 5 in output_2.json, entry 1"));
    assert!(text.contains("discarded"));
}

#[test]
fn merging_same_shard_twice_keeps_first_copy() {
    let tmp = TempDir::new().unwrap();
    let body = json!([record("1", &["a"]), record("2", &[]), record("1", &["b"])]);
    let first = write_shard(tmp.path(), "output_1.json", &body);
    let second = write_shard(tmp.path(), "output_2.json", &body);

    let outcome = merge(&[first, second]);
    let uris: Vec<i64> = outcome.records.iter().map(|r| r.uri).collect();
    assert_eq!(uris, vec![1, 2]);
    assert_eq!(outcome.records[0].spans.cause, vec!["a".to_string()]);
    assert_eq!(outcome.duplicates_skipped, 4);
    assert_eq!(outcome.records_seen, 6);
}

#[test]
fn object_shard_is_skipped_and_later_shards_merge() {
    let tmp = TempDir::new().unwrap();
    write_shard(tmp.path(), "output_1.json", &json!({"uri": 1, "spans": {}, "summaries": {}}));
    write_shard(tmp.path(), "output_2.json", &json!([record("2", &[])]));
    fs::write(tmp.path().join("output_3.json"), "[{not json").unwrap();

    let outcome = merge(&discover_shards(tmp.path()).unwrap());
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].uri, 2);
    assert_eq!(outcome.files_processed, 1);

    let parse_errors: Vec<&Diagnostic> = outcome
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::Parse(PrepError::Parse { .. })))
        .collect();
    assert_eq!(parse_errors.len(), 2);
    assert!(parse_errors[0].to_string().contains("output_1.json"));
}

#[test]
fn bad_records_are_skipped_individually() {
    let tmp = TempDir::new().unwrap();
    let body = json!([
        record("1", &[]),
        {"uri": "abc", "spans": {}, "summaries": {}},
        {"uri": 3, "summaries": {}},
        record("4", &[])
    ]);
    let path = write_shard(tmp.path(), "output_1.json", &body);

    let outcome = merge(&[path]);
    let uris: Vec<i64> = outcome.records.iter().map(|r| r.uri).collect();
    assert_eq!(uris, vec![1, 4]);
    assert_eq!(outcome.diagnostics.len(), 2);
    assert!(outcome.diagnostics[0].to_string().contains("entry 2"));
    assert!(outcome.diagnostics[1].to_string().contains("Missing required field 'spans'"));
}

#[test]
fn every_record_has_all_five_categories() {
    let tmp = TempDir::new().unwrap();
    let body = json!([
        {"uri": 1, "spans": {}, "summaries": {}},
        {"uri": 2, "spans": {"QUESTION": ["why?"], "EXTRA": ["ignored"]}, "summaries": {"CAUSE": "c"}}
    ]);
    let path = write_shard(tmp.path(), "output_1.json", &body);
    let outcome = merge(&[path]);

    for record in &outcome.records {
        let value = serde_json::to_value(record).unwrap();
        for field in ["spans", "summaries"] {
            let keys: Vec<&String> = value[field].as_object().unwrap().keys().collect();
            let mut expected: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
            expected.sort();
            let mut keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            keys.sort();
            assert_eq!(keys, expected);
        }
    }
}

#[test]
fn separate_merges_do_not_share_seen_uris() {
    let tmp = TempDir::new().unwrap();
    let path = write_shard(tmp.path(), "output_1.json", &json!([record("9", &[])]));
    assert_eq!(merge(&[path.clone()]).records.len(), 1);
    assert_eq!(merge(&[path]).records.len(), 1);
}

#[test]
fn discovery_errors_are_config_errors() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        discover_shards(&tmp.path().join("missing")),
        Err(PrepError::Config(_))
    ));

    write_shard(tmp.path(), "notes.json", &json!([]));
    assert!(matches!(discover_shards(tmp.path()), Err(PrepError::Config(_))));
}

#[test]
fn discovery_orders_by_number_unnumbered_first() {
    let tmp = TempDir::new().unwrap();
    for name in ["output_10.json", "output_2.json", "output_final.json", "other.json"] {
        write_shard(tmp.path(), name, &json!([]));
    }
    let names: Vec<String> = discover_shards(tmp.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["output_final.json", "output_2.json", "output_10.json"]);
}

#[test]
fn progress_reports_each_shard_as_it_is_read() {
    let tmp = TempDir::new().unwrap();
    let broken = write_shard(tmp.path(), "output_3.json", &json!({"not": "an array"}));
    let second = write_shard(tmp.path(), "output_2.json", &json!([record("2", &[])]));
    let first = write_shard(tmp.path(), "output_1.json", &json!([record("1", &[])]));

    let mut seen: Vec<(String, usize)> = Vec::new();
    let mut handled = 0usize;
    let outcome = merge_with_progress(&[broken, second, first], |name| {
        handled += 1;
        seen.push((name.to_string(), handled));
    });

    let names: Vec<&str> = seen.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["output_1.json", "output_2.json", "output_3.json"]);
    assert_eq!(outcome.files_processed, 2);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].to_string().contains("output_3.json"));
}
