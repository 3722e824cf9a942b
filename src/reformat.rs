//! Raw QA records to canonical records, rendered as an `<examples>`
//! document of input/output pairs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::Value;

use crate::category::{Category, CategoryMap};
use crate::errors::{PrepError, PrepResult};
use crate::record::{parse_uri, Record};

#[derive(Debug, Clone, Deserialize)]
pub struct LabelledSpan {
    pub txt: String,
}

/// QA record as produced upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct QaRecord {
    pub uri: Value,
    pub question: String,
    pub context: String,
    pub answers: Vec<String>,
    #[serde(default)]
    pub labelled_answer_spans: Option<BTreeMap<String, Vec<LabelledSpan>>>,
    #[serde(default)]
    pub labelled_summaries: Option<BTreeMap<String, String>>,
}

pub fn to_canonical(qa: &QaRecord, source: &str, position: usize) -> PrepResult<Record> {
    let uri = parse_uri(&qa.uri).ok_or_else(|| {
        PrepError::validation(source, position, format!("Invalid URI format: {}", qa.uri))
    })?;

    let mut spans: CategoryMap<Vec<String>> = CategoryMap::default();
    if let Some(labelled) = &qa.labelled_answer_spans {
        for (label, items) in labelled {
            match Category::from_label(label) {
                Some(category) => {
                    *spans.get_mut(category) = items.iter().map(|s| s.txt.clone()).collect();
                }
                None => warn!("uri {uri}: ignoring unknown span category '{label}'"),
            }
        }
    }

    let mut summaries: CategoryMap<String> = CategoryMap::default();
    if let Some(labelled) = &qa.labelled_summaries {
        for category in Category::ALL {
            if let Some(text) = labelled.get(&format!("{category}_SUMMARY")) {
                *summaries.get_mut(category) = text.clone();
            }
        }
    }

    Ok(Record {
        uri,
        spans,
        summaries,
    })
}

/// Pretty printer that writes every character outside printable ASCII as a
/// `\uXXXX` escape (surrogate pairs above U+FFFF).
struct AsciiPretty<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiPretty<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_array(w)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_array(w)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, w: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(w, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_array_value(w)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_object(w)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_object(w)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, w: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(w, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.begin_object_value(w)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.0.end_object_value(w)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, w: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                w.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(w, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

fn to_pretty<T: Serialize>(value: &T, indent: &[u8]) -> PrepResult<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiPretty(PrettyFormatter::with_indent(indent)));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn escape_quotes(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// One `<example>` block for a raw QA value.
pub fn render_example(raw: &Value, source: &str, position: usize) -> PrepResult<String> {
    let qa: QaRecord = serde_json::from_value(raw.clone())
        .map_err(|e| PrepError::validation(source, position, e.to_string()))?;
    let record = to_canonical(&qa, source, position)?;

    let uri_text = match &qa.uri {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let answers = to_pretty(&qa.answers, b"      ")?;
    let output = to_pretty(&record, b"    ")?;

    Ok(format!(
        "<example>\n<input>\n    \"uri\": {uri_text},\n    \"question\": \"{}\",\n    \"context\": \"{}\",\n    \"answers\": {answers}\n</input>\n\n<output>\n{output}\n</output>\n</example>\n\n",
        escape_quotes(&qa.question),
        escape_quotes(&qa.context),
    ))
}

#[derive(Debug, Default)]
pub struct ReformatOutcome {
    pub examples: Vec<String>,
    /// One message per record that could not be converted.
    pub failures: Vec<String>,
    pub total: usize,
}

/// Render every record, skipping the ones that fail. After each record
/// `on_record(processed, total, successful)` is called and the same counts
/// are logged.
pub fn reformat_records<F>(records: &[Value], source: &str, mut on_record: F) -> ReformatOutcome
where
    F: FnMut(usize, usize, usize),
{
    let total = records.len();
    let mut outcome = ReformatOutcome {
        total,
        ..Default::default()
    };

    for (i, raw) in records.iter().enumerate() {
        match render_example(raw, source, i + 1) {
            Ok(example) => outcome.examples.push(example),
            Err(e) => {
                let uri = raw
                    .get("uri")
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".into());
                let message = format!("Error processing QA pair {uri}: {e}");
                warn!("{message}");
                outcome.failures.push(message);
            }
        }
        info!(
            "Processed {}/{} examples ({} successful)",
            i + 1,
            total,
            outcome.examples.len()
        );
        on_record(i + 1, total, outcome.examples.len());
    }
    outcome
}

pub fn render_document(examples: &[String]) -> String {
    let mut doc = String::from("<examples>\n\n");
    for example in examples {
        doc.push_str(example);
    }
    doc.push_str("</examples>");
    doc
}

/// Input files hold an array, or a single record.
pub fn as_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

pub fn backup_path(output: &Path) -> PathBuf {
    output.with_extension("json.bak")
}

/// Move an existing `output` aside. Returns the backup path when one was made.
pub fn backup_existing(output: &Path) -> PrepResult<Option<PathBuf>> {
    if !output.exists() {
        return Ok(None);
    }
    let backup = backup_path(output);
    fs::rename(output, &backup)?;
    Ok(Some(backup))
}
