use std::fs;

use perans_prep::clean::strip_keys;
use perans_prep::io::write_json_pretty;
use perans_prep::merge::merge;
use perans_prep::reformat::{backup_existing, to_canonical, QaRecord};
use perans_prep::training::{build_target, PerspectiveDataset, PerspectiveSample};
use perans_prep::Category;
use serde_json::{json, Value};
use tempfile::TempDir;

fn raw_qa(uri: &str) -> Value {
    json!({
        "uri": uri,
        "question": "What helps with migraines?",
        "context": "recurring headaches",
        "answers": ["Dark room and water.", "Mine went away after cutting caffeine."],
        "raw_text": "dump",
        "labelled_answer_spans": {
            "SUGGESTION": [{"txt": "Dark room and water."}],
            "EXPERIENCE": [{"txt": "Mine went away after cutting caffeine."}]
        },
        "labelled_summaries": {
            "SUGGESTION_SUMMARY": "It is suggested to rest in a dark room.",
            "EXPERIENCE_SUMMARY": "In user's experience, cutting caffeine helped."
        }
    })
}

#[test]
fn cleaned_and_reformatted_records_merge_unchanged() {
    let tmp = TempDir::new().unwrap();
    let mut raw = vec![raw_qa("1"), raw_qa("2")];
    assert_eq!(strip_keys(&mut raw, &["raw_text".to_string()]), 2);

    let canonical: Vec<_> = raw
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let qa: QaRecord = serde_json::from_value(v.clone()).unwrap();
            to_canonical(&qa, "train.json", i + 1).unwrap()
        })
        .collect();

    let shard = tmp.path().join("output_1.json");
    fs::write(&shard, serde_json::to_string_pretty(&canonical).unwrap()).unwrap();

    let outcome = merge(&[shard]);
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.records, canonical);
}

#[test]
fn backup_moves_previous_output_aside() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("reformatted_answers.json");
    assert!(backup_existing(&out).unwrap().is_none());

    fs::write(&out, "old").unwrap();
    let backup = backup_existing(&out).unwrap().unwrap();
    assert_eq!(backup, tmp.path().join("reformatted_answers.json.bak"));
    assert_eq!(fs::read_to_string(backup).unwrap(), "old");
    assert!(!out.exists());
}

#[test]
fn suggestion_with_three_shared_words_is_still_prefixed() {
    let target = build_target("It is suggested you rest", Category::Suggestion);
    assert_eq!(target, "It is suggested It is suggested you rest");

    let target = build_target("It is suggested that you rest", Category::Suggestion);
    assert_eq!(target, "It is suggested It is suggested that you rest");

    let target = build_target("In user's experience it passed", Category::Experience);
    assert_eq!(target, "In user's experience it passed");
}

#[test]
fn labels_decode_to_prefixed_target() {
    let sample = PerspectiveSample {
        answers: vec!["Rest.".to_string()],
        question: "Tired?".to_string(),
        perspective: Category::Suggestion,
        summary: "you rest".to_string(),
    };
    let dataset =
        PerspectiveDataset::with_tokenizer(vec![sample], tiktoken_rs::p50k_base().unwrap(), 32);
    let bpe = tiktoken_rs::p50k_base().unwrap();
    let example = dataset.get(0).unwrap();

    let real: Vec<u32> = example
        .labels
        .iter()
        .copied()
        .take_while(|&t| t != perans_prep::training::PAD_TOKEN_ID)
        .collect();
    let expected: Vec<u32> = bpe
        .encode_with_special_tokens("It is suggested you rest")
        .into_iter()
        .map(|t| t as u32)
        .collect();
    assert_eq!(real, expected);
}

#[test]
fn stripped_records_are_written_in_source_field_order() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("clean.json");
    let mut items = vec![raw_qa("7")];

    assert_eq!(strip_keys(&mut items, &["raw_text".to_string()]), 1);
    write_json_pretty(&out, &items).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert!(!text.contains("raw_text"));
    let at = |key: &str| text.find(&format!("\"{key}\"")).unwrap();
    assert!(at("uri") < at("question"));
    assert!(at("question") < at("context"));
    assert!(at("context") < at("answers"));
}
