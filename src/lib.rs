//! Data preparation for perspective-aware answer summarization: merge,
//! split, clean and reformat JSON datasets, and build tokenized training
//! examples.

pub mod category;
pub mod clean;
pub mod errors;
pub mod io;
pub mod logging;
pub mod merge;
pub mod record;
pub mod reformat;
pub mod split;
pub mod training;

pub use category::{Category, CategoryMap};
pub use errors::{PrepError, PrepResult};
pub use merge::{merge, Diagnostic, MergeOutcome};
pub use record::{normalize, Record};
pub use split::{split, verify_round_trip, ValidationReport};
