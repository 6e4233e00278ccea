//! Category-tagged regex baseline classifier.
//!
//! The manual-label baseline used alongside the keyword prefilter: a
//! table of regexes, each carrying an id and a category, scanned over
//! the manager's answer. A row is a baseline non-answer when any hit
//! falls into one of the configured categories.
//!
//! Hits can arrive in heterogeneous shapes when they cross a
//! serialization boundary (a structured record, a bare id, or a
//! stringified record), so [`RegexHit`] models them as a tagged sum
//! type with one extraction path per variant instead of shape-sniffing
//! at the call site.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// The category a baseline rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Explicit refusal to answer.
    Refuse,
    /// Inability to answer (does not know, cannot predict).
    Unable,
    /// Deferral to a later call or follow-up.
    Aftercall,
}

/// One hit from the baseline scan, in any of the shapes it may take
/// after crossing a serialization boundary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RegexHit {
    /// A structured record carrying the rule id.
    Record {
        /// Id of the rule that fired.
        regex_id: u32,
    },
    /// A bare rule id.
    Id(u32),
    /// A stringified record, e.g. `{"regex_id": 3}`.
    Text(String),
}

impl RegexHit {
    /// Extract the rule id, one path per variant.
    ///
    /// Returns `None` for textual hits that do not contain a
    /// well-formed record.
    pub fn regex_id(&self) -> Option<u32> {
        match self {
            RegexHit::Record { regex_id } => Some(*regex_id),
            RegexHit::Id(id) => Some(*id),
            RegexHit::Text(text) => {
                let value: Value = serde_json::from_str(text.trim()).ok()?;
                value.get("regex_id")?.as_u64()?.try_into().ok()
            }
        }
    }
}

/// The baseline verdict for one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineVerdict {
    /// Any configured category matched.
    pub is_nonanswer: bool,
    /// A REFUSE rule matched.
    pub is_refuse: bool,
    /// An UNABLE rule matched.
    pub is_unable: bool,
    /// An AFTERCALL rule matched.
    pub is_aftercall: bool,
}

struct BaselineRule {
    regex_id: u32,
    category: Category,
    pattern: Regex,
}

/// The regex-table classifier.
pub struct BaselineClassifier {
    rules: Vec<BaselineRule>,
}

impl BaselineClassifier {
    /// Build the classifier with the built-in rule table.
    pub fn new() -> Self {
        let table: &[(u32, Category, &str)] = &[
            (1, Category::Refuse, r"(?i)\bno comment\b"),
            (2, Category::Refuse, r"(?i)\b(would|we'd|i'd)? ?rather not\b"),
            (3, Category::Refuse, r"(?i)\bdecline[ds]? to (answer|comment|discuss)\b"),
            (4, Category::Refuse, r"(?i)\bnot going to (comment|discuss|get into)\b"),
            (5, Category::Refuse, r"(?i)\b(don't|do not|won't|will not) disclose\b"),
            (6, Category::Unable, r"(?i)\b(don't|do not) know\b"),
            (7, Category::Unable, r"(?i)\b(can't|cannot|hard to|difficult to) predict\b"),
            (8, Category::Unable, r"(?i)\b(unable|not able) to (answer|say|quantify)\b"),
            (9, Category::Unable, r"(?i)\btoo early to (say|tell|know)\b"),
            (10, Category::Aftercall, r"(?i)\btake (it|this|that) offline\b"),
            (11, Category::Aftercall, r"(?i)\b(circle|get) back to you\b"),
            (12, Category::Aftercall, r"(?i)\bfollow up (with you )?after the call\b"),
        ];
        let rules = table
            .iter()
            .map(|(regex_id, category, pattern)| BaselineRule {
                regex_id: *regex_id,
                category: *category,
                pattern: Regex::new(pattern).expect("rule patterns are well-formed"),
            })
            .collect();
        Self { rules }
    }

    /// Scan an answer and return a hit per matching rule.
    pub fn scan(&self, answer: &str) -> Vec<RegexHit> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(answer))
            .map(|rule| RegexHit::Record {
                regex_id: rule.regex_id,
            })
            .collect()
    }

    /// Look up the category a rule id belongs to.
    pub fn category_of(&self, regex_id: u32) -> Option<Category> {
        self.rules
            .iter()
            .find(|rule| rule.regex_id == regex_id)
            .map(|rule| rule.category)
    }

    /// Classify one answer against all three categories.
    ///
    /// Blank answers never classify as non-answers.
    pub fn classify(&self, answer: &str) -> BaselineVerdict {
        if answer.trim().is_empty() {
            return BaselineVerdict::default();
        }

        let mut verdict = BaselineVerdict::default();
        for hit in self.scan(answer) {
            let Some(id) = hit.regex_id() else { continue };
            match self.category_of(id) {
                Some(Category::Refuse) => verdict.is_refuse = true,
                Some(Category::Unable) => verdict.is_unable = true,
                Some(Category::Aftercall) => verdict.is_aftercall = true,
                None => {}
            }
        }
        verdict.is_nonanswer = verdict.is_refuse || verdict.is_unable || verdict.is_aftercall;
        verdict
    }
}

impl Default for BaselineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
