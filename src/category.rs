use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PrepError;

/// The five perspective labels a span or summary can carry.
///
/// Declaration order is the order categories are written out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Category {
    Experience,
    Information,
    Cause,
    Suggestion,
    Question,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Experience,
        Category::Information,
        Category::Cause,
        Category::Suggestion,
        Category::Question,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Experience => "EXPERIENCE",
            Category::Information => "INFORMATION",
            Category::Cause => "CAUSE",
            Category::Suggestion => "SUGGESTION",
            Category::Question => "QUESTION",
        }
    }

    /// Parse a label, ignoring surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s)
            .ok_or_else(|| PrepError::Config(format!("unknown perspective category '{s}'")))
    }
}

impl TryFrom<String> for Category {
    type Error = PrepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One value per category. Every category is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CategoryMap<T> {
    pub experience: T,
    pub information: T,
    pub cause: T,
    pub suggestion: T,
    pub question: T,
}

impl<T> CategoryMap<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Experience => &self.experience,
            Category::Information => &self.information,
            Category::Cause => &self.cause,
            Category::Suggestion => &self.suggestion,
            Category::Question => &self.question,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Experience => &mut self.experience,
            Category::Information => &mut self.information,
            Category::Cause => &mut self.cause,
            Category::Suggestion => &mut self.suggestion,
            Category::Question => &mut self.question,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}
