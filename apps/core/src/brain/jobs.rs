//! Job listings supplied by the caller and the keyword search over them.

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// A single job listing. Unknown fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    /// Empty when the caller sent no title.
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobListing {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            salary: None,
            location: None,
            schedule: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Ordered mapping from category name to its listings.
///
/// Serialized as a JSON object; deserialization keeps the document order of the keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobBoard {
    categories: Vec<(String, Vec<JobListing>)>,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a category, or extends it if the name is already present.
    pub fn insert(&mut self, category: impl Into<String>, listings: Vec<JobListing>) {
        let category = category.into();
        match self.categories.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => existing.extend(listings),
            None => self.categories.push((category, listings)),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[JobListing]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, listings)| listings.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &[JobListing])> {
        self.categories
            .iter()
            .map(|(name, listings)| (name.as_str(), listings.as_slice()))
    }
}

impl Serialize for JobBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (name, listings) in &self.categories {
            map.serialize_entry(name, listings)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for JobBoard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoardVisitor;

        impl<'de> Visitor<'de> for BoardVisitor {
            type Value = JobBoard;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to job listings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<JobBoard, A::Error> {
                let mut board = JobBoard::new();
                while let Some((name, listings)) =
                    access.next_entry::<String, Vec<JobListing>>()?
                {
                    board.insert(name, listings);
                }
                Ok(board)
            }
        }

        deserializer.deserialize_map(BoardVisitor)
    }
}

/// Keyword rule selecting one category of the board
#[derive(Debug, Clone)]
pub struct JobCategoryRule {
    pub category: String,
    pub pattern: Regex,
}

impl JobCategoryRule {
    pub fn new(category: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            category: category.to_string(),
            pattern: Regex::new(pattern)?,
        })
    }
}

static DEFAULT_CATEGORY_RULES: LazyLock<Vec<JobCategoryRule>> = LazyLock::new(|| {
    [
        ("нефтегаз", r"нефтегаз|нефт|газ"),
        ("строительство", r"строительств|стройк|монтаж"),
        ("логистика", r"водител|логистик|перевозк"),
        ("с_обучением", r"обучени|без опыта"),
        ("с_опытом", r"с опытом|опытн"),
    ]
    .into_iter()
    .map(|(category, pattern)| {
        JobCategoryRule::new(category, pattern).expect("Invalid regex: job category")
    })
    .collect()
});

/// Keyword search over a [`JobBoard`]
#[derive(Debug, Clone)]
pub struct JobSearch {
    rules: Vec<JobCategoryRule>,
    cap: usize,
}

impl JobSearch {
    pub fn new(cap: usize) -> Self {
        Self {
            rules: DEFAULT_CATEGORY_RULES.clone(),
            cap,
        }
    }

    pub fn with_rules(rules: Vec<JobCategoryRule>, cap: usize) -> Self {
        Self { rules, cap }
    }

    /// Union of the listings in every category whose keyword appears in the question,
    /// in board order. With no usable category match, every category is included.
    /// The result is truncated to the cap; nothing is reordered or scored.
    pub fn search(&self, question: &str, board: &JobBoard) -> Vec<JobListing> {
        let normalized = question.to_lowercase();
        let wanted: Vec<&str> = self
            .rules
            .iter()
            .filter(|rule| rule.pattern.is_match(&normalized))
            .map(|rule| rule.category.as_str())
            .collect();

        let selected: Vec<JobListing> = board
            .iter()
            .filter(|(name, _)| wanted.contains(name))
            .flat_map(|(_, listings)| listings.iter().cloned())
            .take(self.cap)
            .collect();

        if !selected.is_empty() {
            return selected;
        }

        board
            .iter()
            .flat_map(|(_, listings)| listings.iter().cloned())
            .take(self.cap)
            .collect()
    }
}
