//! Per-perspective training examples: instruction prompt, target text with
//! the conditional lead-in, and fixed-length BPE token ids.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::category::Category;
use crate::errors::{PrepError, PrepResult};

/// `<|endoftext|>` in p50k_base, used for padding.
pub const PAD_TOKEN_ID: u32 = 50256;

/// When a summary already overlaps its lead-in enough to skip prefixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapRule {
    MoreThan(usize),
    AtLeast(usize),
}

impl OverlapRule {
    pub fn skips_prefix(self, shared: usize) -> bool {
        match self {
            OverlapRule::MoreThan(n) => shared > n,
            OverlapRule::AtLeast(n) => shared >= n,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PerspectiveProfile {
    pub definition: &'static str,
    pub lead_in: &'static str,
    pub tone: &'static str,
    pub overlap: OverlapRule,
}

// SUGGESTION compares with `>`, the rest with `>=`; keep them distinct.
static PROFILES: phf::Map<&'static str, PerspectiveProfile> = phf::phf_map! {
    "SUGGESTION" => PerspectiveProfile {
        definition: "Defined as advice or recommendations to assist users in making informed medical decisions, solving problems, or improving health issues.",
        lead_in: "It is suggested",
        tone: "Advisory, Recommending",
        overlap: OverlapRule::MoreThan(3),
    },
    "INFORMATION" => PerspectiveProfile {
        definition: "Defined as knowledge about diseases, disorders, and health-related facts, providing insights into symptoms and diagnosis.",
        lead_in: "For information purposes",
        tone: "Informative, Educational",
        overlap: OverlapRule::AtLeast(2),
    },
    "EXPERIENCE" => PerspectiveProfile {
        definition: "Defined as individual experiences, anecdotes, or firsthand insights related to health, medical treatments, medication usage, and coping strategies",
        lead_in: "In user's experience",
        tone: "Personal, Narrative",
        overlap: OverlapRule::AtLeast(2),
    },
    "CAUSE" => PerspectiveProfile {
        definition: "Defined as reasons responsible for the occurrence of a particular medical condition, symptom, or disease",
        lead_in: "Some of the causes",
        tone: "Explanatory, Causal",
        overlap: OverlapRule::AtLeast(2),
    },
    "QUESTION" => PerspectiveProfile {
        definition: "Defined as inquiry made for deeper understanding.",
        lead_in: "It is inquired",
        tone: "Seeking Understanding",
        overlap: OverlapRule::AtLeast(2),
    },
};

pub fn profile(category: Category) -> &'static PerspectiveProfile {
    PROFILES
        .get(category.as_str())
        .expect("every category has a profile")
}

/// Distinct words among the first five space-separated words of `summary`
/// that also appear in `lead_in`.
pub fn shared_lead_in_words(summary: &str, lead_in: &str) -> usize {
    let head: HashSet<&str> = summary.split(' ').take(5).collect();
    let lead: HashSet<&str> = lead_in.split_whitespace().collect();
    head.intersection(&lead).count()
}

pub fn build_target(summary: &str, category: Category) -> String {
    let p = profile(category);
    if p.overlap.skips_prefix(shared_lead_in_words(summary, p.lead_in)) {
        summary.to_string()
    } else {
        format!("{} {}", p.lead_in, summary)
    }
}

/// One flattened row of the training set: a single perspective of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveSample {
    pub answers: Vec<String>,
    pub question: String,
    #[serde(rename = "Perspective")]
    pub perspective: Category,
    #[serde(rename = "Summary")]
    pub summary: String,
}

pub fn build_prompt(sample: &PerspectiveSample) -> String {
    let p = profile(sample.perspective);
    let content = sample
        .answers
        .iter()
        .map(|a| a.replace('\n', ""))
        .collect::<Vec<_>>()
        .join(" ");
    // "{perspective}and start" has no space in the trained prompts
    format!(
        "Adhering to the condition of 'begin summary with' and 'tone of summary' and summarize according to {}and start the summary with '{}'. Maintain summary tone as {}. Definition of perspective: {} Content to summarize: {} Question: {}.",
        sample.perspective,
        p.lead_in.trim(),
        p.tone.trim(),
        p.definition.trim().to_lowercase(),
        content,
        sample.question.trim(),
    )
}

/// Token ids truncated to `max_length` and right-padded, with the matching
/// attention mask.
pub fn encode_padded(bpe: &CoreBPE, text: &str, max_length: usize) -> (Vec<u32>, Vec<u32>) {
    let mut ids: Vec<u32> = bpe
        .encode_with_special_tokens(text)
        .into_iter()
        .map(|t| t as u32)
        .collect();
    ids.truncate(max_length);
    let mut mask = vec![1u32; ids.len()];
    ids.resize(max_length, PAD_TOKEN_ID);
    mask.resize(max_length, 0);
    (ids, mask)
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenizedExample {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels: Vec<u32>,
    pub perspective: Category,
    #[serde(rename = "Summary")]
    pub summary: String,
}

pub struct PerspectiveDataset {
    samples: Vec<PerspectiveSample>,
    bpe: CoreBPE,
    max_length: usize,
}

impl PerspectiveDataset {
    /// Dataset over the p50k_base tokenizer.
    pub fn new(samples: Vec<PerspectiveSample>, max_length: usize) -> PrepResult<Self> {
        let bpe = tiktoken_rs::p50k_base().map_err(|e| PrepError::Tokenizer(e.to_string()))?;
        Ok(Self::with_tokenizer(samples, bpe, max_length))
    }

    pub fn with_tokenizer(samples: Vec<PerspectiveSample>, bpe: CoreBPE, max_length: usize) -> Self {
        Self {
            samples,
            bpe,
            max_length,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<TokenizedExample> {
        let sample = self.samples.get(idx)?;
        let (input_ids, attention_mask) =
            encode_padded(&self.bpe, &build_prompt(sample), self.max_length);
        let target = build_target(&sample.summary, sample.perspective);
        let (labels, _) = encode_padded(&self.bpe, &target, self.max_length);
        Some(TokenizedExample {
            input_ids,
            attention_mask,
            labels,
            perspective: sample.perspective,
            summary: sample.summary.clone(),
        })
    }
}

/// Index batches over `len` items. Train and validation loaders shuffle,
/// test loaders keep source order.
pub fn batch_order(len: usize, batch_size: usize, shuffle: bool, seed: u64) -> PrepResult<Vec<Vec<usize>>> {
    if batch_size == 0 {
        return Err(PrepError::Config("batch size must be positive".to_string()));
    }
    let mut order: Vec<usize> = (0..len).collect();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }
    Ok(order.chunks(batch_size).map(<[usize]>::to_vec).collect())
}
